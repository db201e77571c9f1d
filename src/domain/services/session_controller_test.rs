use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::SessionController;
use super::WELCOME_MESSAGE;
use crate::domain::models::ChatResponse;
use crate::domain::models::ConnectionStatus;
use crate::domain::models::HistoryExport;
use crate::domain::models::Message;
use crate::domain::models::MessageStatus;
use crate::domain::models::Notification;
use crate::domain::models::NotificationKind;
use crate::domain::models::Role;
use crate::domain::models::Sender;
use crate::domain::models::SettingsPatch;
use crate::domain::models::StorageBackend;
use crate::domain::models::StorageKey;
use crate::domain::models::Theme;
use crate::domain::models::TransportError;
use crate::domain::services::fakes::fail;
use crate::domain::services::fakes::reply;
use crate::domain::services::fakes::RequestLog;
use crate::domain::services::fakes::Scripted;
use crate::domain::services::fakes::ScriptedBackend;
use crate::domain::services::PersistentStore;
use crate::domain::services::DEFAULT_TIMEOUT;
use crate::infrastructure::storage::MemoryStorage;

/// Storage shared between the controller and the test so persisted values can
/// be inspected.
#[derive(Clone, Default)]
struct SharedStorage {
    inner: Arc<MemoryStorage>,
}

#[async_trait]
impl StorageBackend for SharedStorage {
    async fn read(&self, key: StorageKey) -> Result<Option<String>> {
        return self.inner.read(key).await;
    }

    async fn write(&self, key: StorageKey, value: &str) -> Result<()> {
        return self.inner.write(key, value).await;
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        return self.inner.remove(key).await;
    }
}

impl SharedStorage {
    async fn stored_messages(&self) -> Vec<Message> {
        return PersistentStore::new(Box::new(self.clone()))
            .load(StorageKey::Messages, vec![])
            .await;
    }
}

struct Harness {
    controller: Arc<SessionController>,
    storage: SharedStorage,
    requests: RequestLog,
    rx: mpsc::UnboundedReceiver<Notification>,
}

async fn harness_with_storage(script: Vec<Scripted>, storage: SharedStorage) -> Harness {
    let (backend, requests) = ScriptedBackend::new(script);
    let (tx, rx) = mpsc::unbounded_channel::<Notification>();
    let controller = SessionController::new(
        Box::new(backend),
        PersistentStore::new(Box::new(storage.clone())),
        DEFAULT_TIMEOUT,
        tx,
    )
    .await;

    return Harness {
        controller: Arc::new(controller),
        storage,
        requests,
        rx,
    };
}

async fn harness(script: Vec<Scripted>) -> Harness {
    return harness_with_storage(script, SharedStorage::default()).await;
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<NotificationKind> {
    let mut kinds = vec![];
    while let Ok(notification) = rx.try_recv() {
        kinds.push(notification.kind);
    }

    return kinds;
}

mod open {
    use super::*;

    #[tokio::test]
    async fn it_creates_one_welcome_message() {
        let h = harness(vec![]).await;

        h.controller.open().await;
        assert!(h.controller.is_open().await);

        let messages = h.controller.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Assistant);
        assert_eq!(messages[0].text, WELCOME_MESSAGE);
        assert_eq!(messages[0].status, MessageStatus::Ok);
        assert_eq!(messages[0].confidence, None);
        assert_eq!(h.storage.stored_messages().await, messages);

        h.controller.close().await;
        assert!(!h.controller.is_open().await);

        h.controller.open().await;
        assert_eq!(h.controller.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn it_skips_welcome_for_existing_conversations() {
        let storage = SharedStorage::default();
        PersistentStore::new(Box::new(storage.clone())).save(
            StorageKey::Messages,
            &vec![Message::from_user("Hello", None)],
        )
        .await;

        let h = harness_with_storage(vec![], storage).await;
        h.controller.open().await;

        let messages = h.controller.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "Hello");
    }
}

mod send_user_message {
    use super::*;

    #[tokio::test]
    async fn it_ignores_blank_text() {
        let h = harness(vec![]).await;

        h.controller.send_user_message("", None).await;
        h.controller.send_user_message("   \n\t", Some(Role::Student)).await;

        assert!(h.controller.messages().await.is_empty());
        assert!(h.requests.lock().unwrap().is_empty());
        assert_eq!(h.controller.connection_status(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn it_exchanges_messages() {
        let mut h = harness(vec![reply("Hi!", Some("student"), Some(0.9))]).await;
        h.controller.set_draft("  Hello  ").await;

        h.controller
            .send_user_message("  Hello  ", Some(Role::Student))
            .await;

        let messages = h.controller.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[0].text, "  Hello  ");
        assert_eq!(messages[0].role_hint, Some(Role::Student));
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert_eq!(messages[1].text, "Hi!");
        assert_eq!(messages[1].confidence, Some(0.9));

        assert_eq!(h.requests.lock().unwrap()[0].message, "Hello");
        assert_eq!(h.controller.draft().await, "");
        assert_eq!(h.controller.connection_status(), ConnectionStatus::Connected);
        assert_eq!(h.storage.stored_messages().await, messages);
        assert!(drain(&mut h.rx).is_empty());
    }

    #[tokio::test]
    async fn it_notifies_on_detected_context() {
        let mut h = harness(vec![reply("Hi!", Some("parent"), None)]).await;

        h.controller
            .send_user_message("  Hello  ", Some(Role::Student))
            .await;

        assert_eq!(
            drain(&mut h.rx),
            vec![NotificationKind::ContextDetected(Role::Parent)]
        );
        assert_eq!(h.controller.role().await, None);
        assert_eq!(
            h.controller.messages().await[1].role_hint,
            Some(Role::Parent)
        );
    }

    #[tokio::test]
    async fn it_keeps_the_user_message_on_failure() {
        let mut h = harness(vec![fail(TransportError::Status {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            detail: None,
        })]).await;

        h.controller.send_user_message("Hello", None).await;

        let messages = h.controller.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "Hello");
        assert_eq!(messages[1].status, MessageStatus::Error);
        insta::assert_snapshot!(
            messages[1].text,
            @"The assistant service returned an error (500 Internal Server Error)."
        );

        assert_eq!(h.controller.connection_status(), ConnectionStatus::Error);
        assert_eq!(h.storage.stored_messages().await, messages);
        assert_eq!(
            drain(&mut h.rx),
            vec![NotificationKind::SendError(messages[1].text.to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn it_commits_the_user_message_before_the_exchange_resolves() -> Result<()> {
        let h = harness(vec![Scripted::Delayed(
            Duration::from_secs(10),
            Ok(Default::default()),
        )])
        .await;

        let controller = h.controller.clone();
        let worker = tokio::spawn(async move {
            controller.send_user_message("Hello", None).await;
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        let messages = h.controller.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(h.storage.stored_messages().await.len(), 1);
        assert_eq!(h.controller.connection_status(), ConnectionStatus::Connecting);
        assert!(h.controller.is_busy());

        worker.await?;
        assert_eq!(h.controller.messages().await.len(), 2);
        assert_eq!(h.controller.connection_status(), ConnectionStatus::Connected);
        assert!(!h.controller.is_busy());

        return Ok(());
    }

    #[tokio::test(start_paused = true)]
    async fn it_appends_one_error_on_timeout() {
        let mut h = harness(vec![Scripted::Hang]).await;
        let start = tokio::time::Instant::now();

        h.controller.send_user_message("Hello", None).await;

        assert!(start.elapsed() >= Duration::from_secs(30));
        assert!(start.elapsed() < Duration::from_secs(31));
        assert!(!h.controller.is_busy());

        let messages = h.controller.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].status, MessageStatus::Error);
        insta::assert_snapshot!(
            messages[1].text,
            @"The assistant took too long to respond. Please try again."
        );
        assert_eq!(drain(&mut h.rx).len(), 1);
    }

    #[tokio::test]
    async fn it_reports_offline_failures() {
        let h = harness(vec![fail(TransportError::Request(
            "connection refused".to_string(),
        ))])
        .await;
        h.controller.environment_online(false).await;

        h.controller.send_user_message("Hello", None).await;

        insta::assert_snapshot!(
            h.controller.messages().await[1].text,
            @"You appear to be offline. Check your connection and try again."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn it_serialises_concurrent_sends() {
        let h = harness(vec![
            Scripted::Delayed(Duration::from_secs(5), Ok(reply_body("first reply"))),
            Scripted::Delayed(Duration::from_secs(1), Ok(reply_body("second reply"))),
        ])
        .await;

        tokio::join!(
            h.controller.send_user_message("first", None),
            h.controller.send_user_message("second", None),
        );

        let texts = h
            .controller
            .messages()
            .await
            .iter()
            .map(|msg| return msg.text.to_string())
            .collect::<Vec<String>>();
        assert_eq!(texts, vec!["first", "first reply", "second", "second reply"]);
    }

    fn reply_body(text: &str) -> ChatResponse {
        return ChatResponse {
            response: text.to_string(),
            detected_role: None,
            confidence: None,
        };
    }

    #[tokio::test]
    async fn it_sends_with_the_selected_role() {
        let h = harness(vec![reply("Hi!", None, None)]).await;
        h.controller.select_role(Role::Teacher).await;

        h.controller.send("Hello").await;

        assert_eq!(h.requests.lock().unwrap()[0].role, Some(Role::Teacher));
        assert_eq!(
            h.controller.messages().await[0].role_hint,
            Some(Role::Teacher)
        );
    }
}

mod history {
    use super::*;

    #[tokio::test]
    async fn it_clears_history() {
        let mut h = harness(vec![reply("Hi!", None, None)]).await;
        h.controller.open().await;
        h.controller.send_user_message("Hello", None).await;
        assert_eq!(h.controller.messages().await.len(), 3);

        h.controller.clear_history().await;

        assert!(h.controller.messages().await.is_empty());
        assert!(h.storage.stored_messages().await.is_empty());
        assert_eq!(
            h.storage.inner.read(StorageKey::Messages).await.unwrap(),
            Some("[]".to_string())
        );
        assert_eq!(drain(&mut h.rx), vec![NotificationKind::HistoryCleared]);
    }

    #[tokio::test]
    async fn it_round_trips_exports() -> Result<()> {
        let mut h = harness(vec![reply("Hi!", Some("student"), Some(0.9))]).await;
        h.controller.select_role(Role::Student).await;
        h.controller.open().await;
        h.controller.send("Hello").await;
        drain(&mut h.rx);

        let before = h.controller.messages().await;
        let document = h.controller.export_history().await?;
        assert_eq!(h.controller.messages().await, before);
        assert_eq!(drain(&mut h.rx), vec![NotificationKind::HistoryExported]);

        let storage = SharedStorage::default();
        PersistentStore::new(Box::new(storage.clone()))
            .restore(&HistoryExport::from_document(&document)?)
            .await;
        let restored = harness_with_storage(vec![], storage).await;

        assert_eq!(restored.controller.messages().await, before);
        assert_eq!(restored.controller.role().await, Some(Role::Student));

        return Ok(());
    }
}

mod role_and_settings {
    use super::*;

    #[tokio::test]
    async fn it_persists_roles() {
        let mut h = harness(vec![]).await;

        h.controller.select_role(Role::Parent).await;
        assert_eq!(h.controller.presets().await, Role::Parent.presets());
        assert_eq!(
            drain(&mut h.rx),
            vec![NotificationKind::RoleSelected(Role::Parent)]
        );

        let reloaded = harness_with_storage(vec![], h.storage.clone()).await;
        assert_eq!(reloaded.controller.role().await, Some(Role::Parent));

        h.controller.clear_role().await;
        assert!(h.controller.presets().await.is_empty());
        let reloaded = harness_with_storage(vec![], h.storage.clone()).await;
        assert_eq!(reloaded.controller.role().await, None);
    }

    #[tokio::test]
    async fn it_updates_and_persists_settings() {
        let h = harness(vec![]).await;

        let settings = h
            .controller
            .update_settings(SettingsPatch {
                theme: Some(Theme::Dark),
                sound_enabled: Some(false),
                ..SettingsPatch::default()
            })
            .await;
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.notifications);

        let reloaded = harness_with_storage(vec![], h.storage.clone()).await;
        assert_eq!(reloaded.controller.settings().await, settings);
    }

    #[tokio::test]
    async fn it_drops_notifications_when_disabled() {
        let mut h = harness(vec![]).await;
        h.controller
            .update_settings(SettingsPatch {
                notifications: Some(false),
                ..SettingsPatch::default()
            })
            .await;

        h.controller.select_role(Role::Teacher).await;
        h.controller.clear_history().await;

        assert!(drain(&mut h.rx).is_empty());
    }

    #[tokio::test]
    async fn it_flags_sound_on_notifications() {
        let mut h = harness(vec![]).await;
        h.controller.select_role(Role::Teacher).await;
        assert!(h.rx.try_recv().unwrap().sound);

        h.controller
            .update_settings(SettingsPatch {
                sound_enabled: Some(false),
                ..SettingsPatch::default()
            })
            .await;
        h.controller.clear_history().await;
        assert!(!h.rx.try_recv().unwrap().sound);
    }

    #[tokio::test]
    async fn it_forwards_environment_signals() {
        let mut h = harness(vec![]).await;

        h.controller.environment_online(true).await;
        h.controller.environment_online(false).await;
        h.controller.environment_online(false).await;
        h.controller.environment_online(true).await;

        assert_eq!(
            drain(&mut h.rx),
            vec![
                NotificationKind::ConnectionLost,
                NotificationKind::ConnectionRestored
            ]
        );
        assert_eq!(h.controller.connection_status(), ConnectionStatus::Connected);
    }
}
