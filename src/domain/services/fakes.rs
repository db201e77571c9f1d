use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Backend;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatResponse;
use crate::domain::models::TransportError;

pub enum Scripted {
    Respond(Result<ChatResponse, TransportError>),
    Delayed(Duration, Result<ChatResponse, TransportError>),
    Hang,
}

pub type RequestLog = Arc<Mutex<Vec<ChatRequest>>>;

/// Backend answering from a script, one entry per request.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Scripted>>,
    requests: RequestLog,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Scripted>) -> (ScriptedBackend, RequestLog) {
        let requests: RequestLog = Arc::new(Mutex::new(vec![]));
        let backend = ScriptedBackend {
            script: Mutex::new(script.into()),
            requests: requests.clone(),
        };

        return (backend, requests);
    }
}

pub fn reply(text: &str, detected_role: Option<&str>, confidence: Option<f64>) -> Scripted {
    return Scripted::Respond(Ok(ChatResponse {
        response: text.to_string(),
        detected_role: detected_role.map(|role| return role.to_string()),
        confidence,
    }));
}

pub fn fail(err: TransportError) -> Scripted {
    return Scripted::Respond(Err(err));
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Scripted::Respond(res)) => return res,
            Some(Scripted::Delayed(delay, res)) => {
                tokio::time::sleep(delay).await;
                return res;
            }
            Some(Scripted::Hang) => {
                futures::future::pending::<()>().await;
                return Err(TransportError::Request("unreachable".to_string()));
            }
            None => return Err(TransportError::Request("script exhausted".to_string())),
        }
    }
}
