#[cfg(test)]
#[path = "notification_test.rs"]
mod tests;

use std::time::Duration;

use super::Role;

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    ConnectionRestored,
    ConnectionLost,
    RoleSelected(Role),
    ContextDetected(Role),
    HistoryCleared,
    HistoryExported,
    SendError(String),
}

/// Fire-and-forget event for the toast and sound collaborators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub sound: bool,
}

impl Notification {
    pub fn new(kind: NotificationKind) -> Notification {
        return Notification { kind, sound: false };
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            NotificationKind::ConnectionRestored => return Severity::Success,
            NotificationKind::ConnectionLost => return Severity::Error,
            NotificationKind::RoleSelected(_) => return Severity::Success,
            NotificationKind::ContextDetected(_) => return Severity::Info,
            NotificationKind::HistoryCleared => return Severity::Info,
            NotificationKind::HistoryExported => return Severity::Success,
            NotificationKind::SendError(_) => return Severity::Error,
        }
    }

    /// How long the toast should stay on screen.
    pub fn duration(&self) -> Duration {
        match self.severity() {
            Severity::Error => return Duration::from_secs(5),
            Severity::Info | Severity::Success => return Duration::from_secs(3),
        }
    }

    pub fn text(&self) -> String {
        match &self.kind {
            NotificationKind::ConnectionRestored => {
                return "Connection restored".to_string();
            }
            NotificationKind::ConnectionLost => {
                return "Connection lost. Messages will fail until you are back online.".to_string();
            }
            NotificationKind::RoleSelected(role) => {
                return format!("Switched to {role} mode");
            }
            NotificationKind::ContextDetected(role) => {
                return format!("This looks like a {role} question");
            }
            NotificationKind::HistoryCleared => {
                return "Chat history cleared".to_string();
            }
            NotificationKind::HistoryExported => {
                return "Chat history exported".to_string();
            }
            NotificationKind::SendError(message) => {
                return format!("Failed to send message: {message}");
            }
        }
    }
}
