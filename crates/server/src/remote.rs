//! Client for the remote ResilientDB key-value HTTP API.
//!
//! Each operation issues exactly one request. There are no retries; a non-200 status is
//! surfaced as an outcome variant rather than an error so the caller can report it as text.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::tools::DOT_SEGMENTS;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Serialize)]
struct SetBody<'a> {
    id: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetBody {
    #[serde(default)]
    value: Option<Value>,
}

/// Status line of a rejected remote call, e.g. `500 Internal Server Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatus {
    pub code: u16,
    pub reason: Option<String>,
}

impl RemoteStatus {
    fn from_status(status: StatusCode) -> Self {
        Self {
            code: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
        }
    }
}

impl std::fmt::Display for RemoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} {reason}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    Stored,
    Rejected(RemoteStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOutcome {
    Found(Value),
    /// The store answered 200 with a null or absent `value`.
    NotFound,
    Rejected(RemoteStatus),
}

/// HTTP client bound to one remote base URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ResDbClient {
    client: Client,
    base_url: Url,
}

impl ResDbClient {
    /// Build the client from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if !config.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(t) = config.timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// `POST transactions/set` with `{id, value}`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if no response is received.
    pub async fn set(&self, key: &str, value: &str) -> Result<SetOutcome> {
        let url = self.resource_url(&["transactions", "set"])?;
        debug!(url = %url, key = %key, "remote set");

        let response = self
            .client
            .post(url)
            .json(&SetBody { id: key, value })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(key = %key, status = %status, "remote set rejected");
            return Ok(SetOutcome::Rejected(RemoteStatus::from_status(status)));
        }
        Ok(SetOutcome::Stored)
    }

    /// `GET transactions/get/{key}`; the key is sent as one percent-encoded path segment.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if no response is received, or
    /// [`GatewayError::Decode`] if a 200 body is not a JSON object.
    pub async fn get(&self, key: &str) -> Result<GetOutcome> {
        let url = self.resource_url(&["transactions", "get", key])?;
        debug!(url = %url, key = %key, "remote get");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(key = %key, status = %status, "remote get rejected");
            return Ok(GetOutcome::Rejected(RemoteStatus::from_status(status)));
        }

        let bytes = response.bytes().await?;
        let body: GetBody = serde_json::from_slice(&bytes)
            .map_err(|e| GatewayError::Decode(format!("get '{key}': {e}")))?;

        Ok(match body.value {
            None | Some(Value::Null) => GetOutcome::NotFound,
            Some(v) => GetOutcome::Found(v),
        })
    }

    /// Each segment is percent-encoded as a single path segment.
    ///
    /// `url` drops `.` and `..` segments in every spelling (including `%2E`), so those are
    /// refused instead of silently addressing the parent resource.
    fn resource_url(&self, segments: &[&str]) -> Result<Url> {
        if let Some(dot) = segments.iter().find(|s| DOT_SEGMENTS.contains(*s)) {
            return Err(GatewayError::InvalidArgument(format!(
                "key: '{dot}' cannot be sent as a URL path segment"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                GatewayError::Config(format!(
                    "base URL '{}' cannot be used as a base",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
