#[cfg(test)]
#[path = "session_controller_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::sync::Mutex;

use super::AssistantClient;
use super::ConnectionMonitor;
use super::PersistentStore;
use super::RoleContext;
use super::Timeline;
use crate::domain::models::BackendBox;
use crate::domain::models::ConnectionStatus;
use crate::domain::models::HistoryExport;
use crate::domain::models::Message;
use crate::domain::models::Notification;
use crate::domain::models::NotificationKind;
use crate::domain::models::Role;
use crate::domain::models::Settings;
use crate::domain::models::SettingsPatch;
use crate::domain::models::StorageKey;

pub const WELCOME_MESSAGE: &str =
    "Hello! I'm the DTE EMIS assistant. Ask me anything about the portal, or pick a role to see suggested questions.";

struct SessionState {
    timeline: Timeline,
    role: RoleContext,
    settings: Settings,
    open: bool,
    draft: String,
}

/// Owns the conversation, the selected role and the widget settings, and
/// drives every exchange with the assistant service. Shared with the front end
/// as `Arc<SessionController>`.
pub struct SessionController {
    state: Mutex<SessionState>,
    send_gate: Mutex<()>,
    client: AssistantClient,
    monitor: Arc<ConnectionMonitor>,
    store: PersistentStore,
    tx: mpsc::UnboundedSender<Notification>,
}

impl SessionController {
    /// Hydrates state from the store. Missing or corrupt entries fall back to
    /// an empty conversation, no role and default settings.
    pub async fn new(
        backend: BackendBox,
        store: PersistentStore,
        timeout: Duration,
        tx: mpsc::UnboundedSender<Notification>,
    ) -> SessionController {
        let messages: Vec<Message> = store.load(StorageKey::Messages, vec![]).await;
        let role: Option<Role> = store.load(StorageKey::Role, None).await;
        let settings = store.load(StorageKey::Settings, Settings::default()).await;

        let monitor = Arc::new(ConnectionMonitor::default());
        let client = AssistantClient::new(backend, monitor.clone(), timeout);

        return SessionController {
            state: Mutex::new(SessionState {
                timeline: Timeline::new(messages),
                role: RoleContext::new(role),
                settings,
                open: false,
                draft: "".to_string(),
            }),
            send_gate: Mutex::new(()),
            client,
            monitor,
            store,
            tx,
        };
    }

    fn notify(&self, settings: &Settings, kind: NotificationKind) {
        if !settings.notifications {
            tracing::debug!(kind = ?kind, "Notifications disabled, dropping");
            return;
        }

        let notification = Notification {
            kind,
            sound: settings.sound_enabled,
        };
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification receiver is gone");
        }
    }

    pub async fn open(&self) {
        let mut state = self.state.lock().await;
        if state.timeline.is_empty() {
            state.timeline.append(Message::from_assistant(WELCOME_MESSAGE));
            self.store
                .save(StorageKey::Messages, state.timeline.messages())
                .await;
        }

        state.open = true;
    }

    pub async fn close(&self) {
        self.state.lock().await.open = false;
    }

    pub async fn is_open(&self) -> bool {
        return self.state.lock().await.open;
    }

    /// Sends `text` with the currently selected role as hint.
    pub async fn send(&self, text: &str) {
        let role = self.state.lock().await.role.role();
        self.send_user_message(text, role).await;
    }

    pub async fn send_user_message(&self, text: &str, role: Option<Role>) {
        if text.trim().is_empty() {
            return;
        }

        // Sends are serialised so the timeline always reads in send order.
        let _gate = self.send_gate.lock().await;

        {
            let mut state = self.state.lock().await;
            state.timeline.append(Message::from_user(text, role));
            state.draft.clear();
            self.store
                .save(StorageKey::Messages, state.timeline.messages())
                .await;
        }

        self.monitor.begin_exchange();
        let res = self.client.exchange(text, role).await;

        let mut state = self.state.lock().await;
        match res {
            Ok(reply) => {
                self.monitor.finish_exchange(true);

                let detected = reply.role;
                state.timeline.append(Message::from_reply(reply));

                if let Some(detected) = detected {
                    if Some(detected) != role {
                        self.notify(&state.settings, NotificationKind::ContextDetected(detected));
                    }
                }
            }
            Err(err) => {
                self.monitor.finish_exchange(false);
                tracing::error!(error = ?err, "Exchange with the assistant failed");

                let description = err.to_string();
                state.timeline.append(Message::new_error(&description));
                self.notify(&state.settings, NotificationKind::SendError(description));
            }
        }

        self.store
            .save(StorageKey::Messages, state.timeline.messages())
            .await;
    }

    pub async fn clear_history(&self) {
        let mut state = self.state.lock().await;
        state.timeline.clear();
        self.store
            .save(StorageKey::Messages, state.timeline.messages())
            .await;
        self.notify(&state.settings, NotificationKind::HistoryCleared);
    }

    /// Serialises the conversation for the caller to save somewhere.
    pub async fn export_history(&self) -> Result<String> {
        let state = self.state.lock().await;
        let export = HistoryExport::new(state.timeline.messages().to_vec(), state.role.role());
        let document = export.to_document()?;
        self.notify(&state.settings, NotificationKind::HistoryExported);

        return Ok(document);
    }

    pub async fn update_settings(&self, patch: SettingsPatch) -> Settings {
        let mut state = self.state.lock().await;
        state.settings.merge(patch);
        self.store.save(StorageKey::Settings, &state.settings).await;

        return state.settings;
    }

    pub async fn select_role(&self, role: Role) {
        let mut state = self.state.lock().await;
        let notification = state.role.select(role);
        self.store.save(StorageKey::Role, &state.role.role()).await;
        self.notify(&state.settings, notification.kind);
    }

    pub async fn clear_role(&self) {
        let mut state = self.state.lock().await;
        state.role.clear();
        self.store.remove(StorageKey::Role).await;
    }

    /// Environment online/offline signal.
    pub async fn environment_online(&self, online: bool) {
        if let Some(notification) = self.monitor.set_online(online) {
            let settings = self.state.lock().await.settings;
            self.notify(&settings, notification.kind);
        }
    }

    pub async fn messages(&self) -> Vec<Message> {
        return self.state.lock().await.timeline.messages().to_vec();
    }

    pub async fn last_user_text(&self) -> Option<String> {
        let state = self.state.lock().await;
        return state
            .timeline
            .last_user_text()
            .map(|text| return text.to_string());
    }

    pub async fn role(&self) -> Option<Role> {
        return self.state.lock().await.role.role();
    }

    pub async fn presets(&self) -> &'static [&'static str] {
        return self.state.lock().await.role.presets();
    }

    pub async fn settings(&self) -> Settings {
        return self.state.lock().await.settings;
    }

    pub async fn draft(&self) -> String {
        return self.state.lock().await.draft.to_string();
    }

    pub async fn set_draft(&self, text: &str) {
        self.state.lock().await.draft = text.to_string();
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        return self.monitor.status();
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionStatus> {
        return self.monitor.subscribe();
    }

    pub fn is_busy(&self) -> bool {
        return self.client.is_busy();
    }

    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        return self.client.subscribe_busy();
    }
}
