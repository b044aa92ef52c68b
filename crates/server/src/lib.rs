//! MCP server exposing a ResilientDB key-value store as two tools, `set` and `get`.
//!
//! Each tool call is validated against the tool's JSON Schema and translated into exactly one
//! HTTP request against the configured remote API. Remote rejections come back as result text;
//! malformed calls and transport failures come back as MCP errors.

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod remote;
pub mod tools;

pub use config::{Cli, GatewayConfig};
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, ToolResult};
