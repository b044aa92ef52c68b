//! The closed set of tools exposed by the server, their input contracts, and argument validation.

use crate::error::{GatewayError, Result};
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde::Deserialize;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

/// Keys that collapse to nothing when placed in a URL path.
pub const DOT_SEGMENTS: [&str; 2] = [".", ".."];

/// A supported tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvTool {
    Set,
    Get,
}

impl KvTool {
    pub const ALL: [KvTool; 2] = [KvTool::Set, KvTool::Get];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            KvTool::Set => "set",
            KvTool::Get => "get",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            KvTool::Set => "Set a ResilientDB key-value pair",
            KvTool::Get => "Get value by key from ResilientDB",
        }
    }

    /// JSON Schema for the tool's argument bag.
    ///
    /// The same schema is advertised in `tools/list` and enforced on `tools/call`.
    #[must_use]
    pub fn input_schema(self) -> Value {
        let key = json!({
            "type": "string",
            "minLength": 1,
            // A URL path cannot carry these as a segment, so `get` could never reach them.
            "not": { "enum": DOT_SEGMENTS },
            "description": match self {
                KvTool::Set => "ResilientDB key",
                KvTool::Get => "ResilientDB key to retrieve",
            },
        });

        match self {
            KvTool::Set => json!({
                "type": "object",
                "properties": {
                    "key": key,
                    "value": {
                        "type": "string",
                        "description": "Value to store",
                    },
                },
                "required": ["key", "value"],
            }),
            KvTool::Get => json!({
                "type": "object",
                "properties": { "key": key },
                "required": ["key"],
            }),
        }
    }

    /// MCP behaviour hints. Both tools talk to an external store.
    #[must_use]
    pub fn annotations(self) -> ToolAnnotations {
        match self {
            KvTool::Set => ToolAnnotations {
                read_only_hint: Some(false),
                // Overwrites whatever was stored under the key.
                destructive_hint: Some(true),
                idempotent_hint: Some(true),
                open_world_hint: Some(true),
                ..Default::default()
            },
            KvTool::Get => ToolAnnotations {
                read_only_hint: Some(true),
                destructive_hint: Some(false),
                idempotent_hint: Some(true),
                open_world_hint: Some(true),
                ..Default::default()
            },
        }
    }

    /// Build the MCP `Tool` descriptor.
    #[must_use]
    pub fn descriptor(self) -> Tool {
        let schema_obj = self
            .input_schema()
            .as_object()
            .cloned()
            .unwrap_or_else(JsonObject::new);
        let mut tool = Tool::new(self.name(), self.description(), Arc::new(schema_obj));
        tool.annotations = Some(self.annotations());
        tool
    }

    /// Validate a raw argument bag against this tool's schema.
    ///
    /// Every violation is reported, joined into one message as `path: reason` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidArgument`] if any violation is found, or
    /// [`GatewayError::Config`] if the built-in schema itself does not compile.
    pub fn validate(self, args: &Value) -> Result<()> {
        let schema = self.input_schema();
        let validator = jsonschema::validator_for(&schema).map_err(|e| {
            GatewayError::Config(format!("input schema for '{self}' does not compile: {e}"))
        })?;

        let violations: Vec<String> = validator
            .iter_errors(args)
            .map(|e| {
                let path = match e.kind() {
                    jsonschema::error::ValidationErrorKind::Required { property } => property
                        .as_str()
                        .map_or_else(|| property.to_string(), str::to_string),
                    _ => dotted_path(&e.instance_path().to_string()),
                };
                format!("{path}: {e}")
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::InvalidArgument(violations.join(", ")))
        }
    }
}

impl fmt::Display for KvTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `/a/0/b` -> `a.0.b`; the document root renders as `(root)`.
fn dotted_path(pointer: &str) -> String {
    let trimmed = pointer.trim_start_matches('/');
    if trimmed.is_empty() {
        "(root)".to_string()
    } else {
        trimmed.replace('/', ".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetRequest {
    pub key: String,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Set(SetRequest),
    Get(GetRequest),
}

impl ToolCall {
    /// Resolve the tool name and validate its arguments.
    ///
    /// A missing argument bag is treated as `{}`. Extra fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownTool`] for names other than `set`/`get`, and
    /// [`GatewayError::InvalidArgument`] if the arguments fail validation.
    pub fn parse(name: &str, args: Option<JsonObject>) -> Result<Self> {
        let tool =
            KvTool::from_name(name).ok_or_else(|| GatewayError::UnknownTool(name.to_string()))?;

        let args = Value::Object(args.unwrap_or_default());
        tool.validate(&args)?;

        let call = match tool {
            KvTool::Set => ToolCall::Set(from_args(args)?),
            KvTool::Get => ToolCall::Get(from_args(args)?),
        };
        Ok(call)
    }

    #[must_use]
    pub fn tool(&self) -> KvTool {
        match self {
            ToolCall::Set(_) => KvTool::Set,
            ToolCall::Get(_) => KvTool::Get,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            ToolCall::Set(r) => &r.key,
            ToolCall::Get(r) => &r.key,
        }
    }
}

fn from_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| GatewayError::InvalidArgument(e.to_string()))
}
