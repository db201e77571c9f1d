#[cfg(test)]
#[path = "assistant_client_test.rs"]
mod tests;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use super::Reachability;
use crate::domain::models::AssistantError;
use crate::domain::models::AssistantReply;
use crate::domain::models::BackendBox;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatResponse;
use crate::domain::models::Role;
use crate::domain::models::TransportError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Keeps the busy indicator raised for as long as it is alive, including when
/// the exchange future is dropped half way.
struct BusyGuard<'a> {
    client: &'a AssistantClient,
}

impl<'a> BusyGuard<'a> {
    fn new(client: &'a AssistantClient) -> BusyGuard<'a> {
        client.in_flight.fetch_add(1, Ordering::SeqCst);
        client.busy.send_replace(true);
        return BusyGuard { client };
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.client.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.client.busy.send_replace(false);
        }
    }
}

/// Single attempt request/response exchange with the assistant service.
pub struct AssistantClient {
    backend: BackendBox,
    reachability: Arc<dyn Reachability>,
    timeout: Duration,
    busy: watch::Sender<bool>,
    in_flight: AtomicUsize,
}

impl AssistantClient {
    pub fn new(
        backend: BackendBox,
        reachability: Arc<dyn Reachability>,
        timeout: Duration,
    ) -> AssistantClient {
        let (busy, _rx) = watch::channel(false);
        return AssistantClient {
            backend,
            reachability,
            timeout,
            busy,
            in_flight: AtomicUsize::new(0),
        };
    }

    pub fn is_busy(&self) -> bool {
        return *self.busy.borrow();
    }

    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        return self.busy.subscribe();
    }

    pub async fn exchange(
        &self,
        text: &str,
        role: Option<Role>,
    ) -> Result<AssistantReply, AssistantError> {
        let _busy = BusyGuard::new(self);
        let request = ChatRequest::new(text, role);

        let res = tokio::select! {
            res = self.backend.send(&request) => res,
            _ = tokio::time::sleep(self.timeout) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Assistant request cancelled after deadline"
                );
                return Err(AssistantError::Timeout);
            }
        };

        match res {
            Ok(body) => return Ok(self.to_reply(body)),
            Err(err) => return Err(self.classify(err)),
        }
    }

    fn to_reply(&self, body: ChatResponse) -> AssistantReply {
        let role = body.detected_role.as_deref().and_then(|detected| {
            let role = Role::detect(detected);
            if role.is_none() {
                tracing::debug!(detected_role = detected, "Ignoring unknown detected role");
            }
            return role;
        });

        let confidence = body.confidence.filter(|confidence| {
            return confidence.is_finite() && (0.0..=1.0).contains(confidence);
        });

        return AssistantReply {
            text: body.response,
            role,
            confidence,
            timestamp: Utc::now(),
        };
    }

    fn classify(&self, err: TransportError) -> AssistantError {
        if !self.reachability.is_online() {
            return AssistantError::Offline;
        }

        match err {
            TransportError::Status {
                status,
                status_text,
                detail,
            } => {
                return AssistantError::ServerError {
                    status,
                    status_text,
                    detail,
                };
            }
            other => {
                return AssistantError::Unknown {
                    message: other.to_string(),
                };
            }
        }
    }
}
