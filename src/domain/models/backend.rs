#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Role;

/// Body POSTed to the assistant service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub role: Option<Role>,
    pub timestamp: DateTime<Utc>,
}

impl ChatRequest {
    pub fn new(text: &str, role: Option<Role>) -> ChatRequest {
        return ChatRequest {
            message: text.trim().to_string(),
            role,
            timestamp: Utc::now(),
        };
    }
}

/// Successful reply from the assistant service. Only `response` is required,
/// older deployments of the service never send the other two.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub detected_role: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Error body returned alongside non-success statuses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("{status} {status_text}")]
    Status {
        status: u16,
        status_text: String,
        detail: Option<String>,
    },
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Cheap reachability probe, used to feed online/offline signals.
    async fn health_check(&self) -> Result<()>;

    /// Performs a single request/response round trip. Implementations must not
    /// retry, the caller owns deadlines and classification.
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;
}

pub type BackendBox = Box<dyn Backend>;
