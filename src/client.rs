//! Blocking HTTP client for the console backend's snapshot endpoint.
//!
//! - Uses `ureq` (no async); status codes are inspected via the `http` types.
//! - Accepts a bare snapshot body or the backend's `{ "success", "data" }` envelope.

use crate::snapshot::{Snapshot, SnapshotError};
use http::StatusCode;
use log::debug;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug)]
pub enum SourceClientError {
    Transport(String),
    Http { status: u16, message: String },
    Json(serde_json::Error),
    Snapshot(SnapshotError),
    /// Envelope present but `success` was false or `data` missing.
    Rejected(String),
}

impl core::fmt::Display for SourceClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SourceClientError::Transport(s) => write!(f, "transport error: {}", s),
            SourceClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            SourceClientError::Json(e) => write!(f, "json error: {}", e),
            SourceClientError::Snapshot(e) => write!(f, "{}", e),
            SourceClientError::Rejected(s) => write!(f, "backend rejected request: {}", s),
        }
    }
}

impl std::error::Error for SourceClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceClientError::Json(e) => Some(e),
            SourceClientError::Snapshot(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SourceClientError {
    fn from(value: serde_json::Error) -> Self {
        SourceClientError::Json(value)
    }
}

impl From<SnapshotError> for SourceClientError {
    fn from(value: SnapshotError) -> Self {
        SourceClientError::Snapshot(value)
    }
}

impl From<ureq::Error> for SourceClientError {
    fn from(value: ureq::Error) -> Self {
        SourceClientError::Transport(value.to_string())
    }
}

pub struct SnapshotClient {
    agent: ureq::Agent,
    url: String,
}

impl SnapshotClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        SnapshotClient { agent, url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fetch_snapshot(&self) -> Result<Snapshot, SourceClientError> {
        let mut res = self.agent.get(&self.url).header("Accept", "application/json").call()?;
        let status = res.status();
        let body = res.body_mut().read_to_string()?;
        debug!("Snapshot GET {} -> {} ({} bytes)", self.url, status.as_u16(), body.len());
        if !status.is_success() {
            return Err(http_error(status, body));
        }
        parse_snapshot_body(&body)
    }
}

fn http_error(status: StatusCode, body: String) -> SourceClientError {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("<no body>").to_string()
    } else {
        body
    };
    SourceClientError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Decode either `{ "success": true, "data": <snapshot> }` or a bare snapshot.
pub fn parse_snapshot_body(body: &str) -> Result<Snapshot, SourceClientError> {
    let value: Value = serde_json::from_str(body)?;
    let is_envelope = value.get("success").is_some_and(Value::is_boolean);
    let payload = if is_envelope {
        unwrap_envelope(value)?
    } else {
        value
    };
    Ok(Snapshot::from_json_value(payload)?)
}

fn unwrap_envelope(mut value: Value) -> Result<Value, SourceClientError> {
    let success = value.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        let reason = value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("success=false")
            .to_string();
        return Err(SourceClientError::Rejected(reason));
    }
    match value.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(SourceClientError::Rejected("envelope has no data".to_string())),
    }
}
