#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatResponse;
use crate::domain::models::ErrorResponse;
use crate::domain::models::TransportError;

/// Talks JSON over HTTP to the assistant service's `/api/chat` endpoint.
pub struct HttpBackend {
    url: String,
    timeout: String,
    client: reqwest::Client,
}

impl Default for HttpBackend {
    fn default() -> HttpBackend {
        return HttpBackend::new(
            &Config::get(ConfigKey::ApiURL),
            &Config::get(ConfigKey::BackendHealthCheckTimeout),
        );
    }
}

impl HttpBackend {
    pub fn new(url: &str, timeout: &str) -> HttpBackend {
        return HttpBackend {
            url: url.trim_end_matches('/').to_string(),
            timeout: timeout.to_string(),
            client: reqwest::Client::new(),
        };
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Assistant service URL is not defined");
        }

        let res = self
            .client
            .get(format!("{url}/", url = self.url))
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if let Err(err) = res {
            tracing::debug!(error = ?err, "Assistant service is not reachable");
            bail!("Assistant service is not reachable");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        tracing::debug!(body = ?request, "Chat request");

        let res = self
            .client
            .post(format!("{url}/api/chat", url = self.url))
            .json(request)
            .send()
            .await
            .map_err(|err| {
                return TransportError::Request(err.to_string());
            })?;

        let status = res.status();
        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                "Assistant service failed to answer the message"
            );

            let detail = res.json::<ErrorResponse>().await.ok().map(|body| {
                return body.error;
            });

            return Err(TransportError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                detail,
            });
        }

        let body = res.text().await.map_err(|err| {
            return TransportError::Request(err.to_string());
        })?;

        let chat_res = serde_json::from_str::<ChatResponse>(&body).map_err(|err| {
            tracing::error!(error = ?err, body = %body, "Malformed chat response");
            return TransportError::Decode(err.to_string());
        })?;
        tracing::debug!(body = ?chat_res, "Chat response");

        return Ok(chat_res);
    }
}
