//! Error types for the ResilientDB MCP server.

use rmcp::ErrorData;
use thiserror::Error;

/// Main error type for the gateway.
///
/// Remote non-200 statuses are deliberately absent: those are reported to the caller as tool
/// result text, not as errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Argument bag failed schema validation
    #[error("Invalid arguments: {0}")]
    InvalidArgument(String),

    /// Tool name is neither `set` nor `get`
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Outbound HTTP failed before a response was received
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// Remote answered 200 with a body we cannot interpret
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Configuration errors (invalid YAML, bad base URL)
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

impl From<reqwest::Error> for GatewayError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(sanitize_reqwest_error(&value))
    }
}

impl From<GatewayError> for ErrorData {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::InvalidArgument(_) | GatewayError::UnknownTool(_) => {
                ErrorData::invalid_params(value.to_string(), None)
            }
            _ => ErrorData::internal_error(value.to_string(), None),
        }
    }
}

/// Strip credentials, query and fragment from a URL before it ends up in a message.
#[must_use]
pub fn redact_url(url: &url::Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    #[test]
    fn caller_errors_map_to_invalid_params() {
        let e: ErrorData = GatewayError::UnknownTool("delete".to_string()).into();
        assert_eq!(e.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(e.message, "Unknown tool: delete");

        let e: ErrorData = GatewayError::InvalidArgument("value: missing".to_string()).into();
        assert_eq!(e.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(e.message, "Invalid arguments: value: missing");
    }

    #[test]
    fn transport_errors_map_to_internal_error() {
        let e: ErrorData = GatewayError::Transport("connection refused".to_string()).into();
        assert_eq!(e.code, ErrorCode::INTERNAL_ERROR);

        let e: ErrorData = GatewayError::Config("bad schema".to_string()).into();
        assert_eq!(e.code, ErrorCode::INTERNAL_ERROR);
    }

    #[test]
    fn redact_url_drops_credentials_and_query() {
        let url = url::Url::parse("https://user:pw@db.example/api/v1/x?token=abc#frag")
            .expect("url");
        assert_eq!(redact_url(&url), "https://db.example/api/v1/x");
    }
}
