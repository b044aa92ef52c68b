//! Startup configuration.
//!
//! Values are layered: CLI flags (each with an env var) override the optional YAML file, which
//! overrides built-in defaults. The resolved [`GatewayConfig`] is immutable for the life of the
//! process.

use crate::error::{GatewayError, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Base URL of the reference ResilientDB deployment.
pub const DEFAULT_BASE_URL: &str = "https://www.memlensapi.run.place/api/v1/";

#[derive(Parser, Debug, Clone)]
#[command(name = "resdb-mcp")]
#[command(about = "Expose a ResilientDB key-value store as MCP tools over stdio")]
#[command(version)]
pub struct Cli {
    /// Optional YAML config file (`baseUrl`, `verifyTls`, `timeoutSecs`)
    #[arg(long, env = "RESDB_MCP_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the remote key-value API
    #[arg(long, env = "RESDB_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Accept invalid TLS certificates from the remote API (development only)
    #[arg(long, env = "RESDB_INSECURE_SKIP_TLS_VERIFY")]
    pub insecure_skip_tls_verify: bool,

    /// Per-request timeout in seconds (0 = no timeout)
    #[arg(long, env = "RESDB_TIMEOUT_SECS", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Log filter directive (e.g. `info`, `resdb_mcp=debug`)
    #[arg(long, env = "RESDB_MCP_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// On-disk config file shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub verify_tls: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Resolved process-wide configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base of the remote API; always ends with `/`.
    pub base_url: Url,
    /// Verify the remote's TLS certificate. Defaults to `true`.
    pub verify_tls: bool,
    /// `None` leaves the HTTP client default in place.
    pub timeout: Option<Duration>,
}

impl GatewayConfig {
    /// Build a config with TLS verification on and no timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if `base_url` is not a usable `http(s)` base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            verify_tls: true,
            timeout: None,
        })
    }
}

impl Cli {
    /// Merge CLI/env values over the optional config file and defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if the base URL is
    /// invalid.
    pub fn resolve(&self) -> Result<GatewayConfig> {
        let file = match &self.config {
            Some(path) => load_file_config(path)?,
            None => FileConfig::default(),
        };

        let base_url = self
            .base_url
            .as_deref()
            .or(file.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL);

        // The flag can only turn verification off; it never re-enables it over the file.
        let verify_tls = !self.insecure_skip_tls_verify && file.verify_tls.unwrap_or(true);

        let timeout = match self.timeout_secs.or(file.timeout_secs) {
            None | Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        Ok(GatewayConfig {
            base_url: parse_base_url(base_url)?,
            verify_tls,
            timeout,
        })
    }
}

/// Read and parse a YAML config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match [`FileConfig`].
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GatewayError::Config(format!("failed to read config {}: {e}", path.display()))
    })?;
    // An empty file is a valid "no overrides" config.
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yaml::from_str(&raw)?)
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| GatewayError::Config(format!("Invalid base URL '{raw}': {e}")))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(GatewayError::Config(format!(
            "Invalid base URL '{raw}': unsupported scheme '{scheme}'"
        )));
    }
    if url.cannot_be_a_base() {
        return Err(GatewayError::Config(format!(
            "Invalid base URL '{raw}': cannot be used as a base"
        )));
    }

    // Normalize so resource paths always append below the configured prefix.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
