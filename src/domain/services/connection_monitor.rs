#[cfg(test)]
#[path = "connection_monitor_test.rs"]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::watch;

use crate::domain::models::ConnectionStatus;
use crate::domain::models::Notification;
use crate::domain::models::NotificationKind;

/// Whether the environment currently reports network reachability.
pub trait Reachability: Send + Sync {
    fn is_online(&self) -> bool;
}

pub struct ConnectionMonitor {
    status: watch::Sender<ConnectionStatus>,
    online: AtomicBool,
}

impl Default for ConnectionMonitor {
    fn default() -> ConnectionMonitor {
        let (status, _rx) = watch::channel(ConnectionStatus::Connected);
        return ConnectionMonitor {
            status,
            online: AtomicBool::new(true),
        };
    }
}

impl ConnectionMonitor {
    pub fn status(&self) -> ConnectionStatus {
        return *self.status.borrow();
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        return self.status.subscribe();
    }

    pub fn begin_exchange(&self) {
        self.status.send_replace(ConnectionStatus::Connecting);
    }

    pub fn finish_exchange(&self, success: bool) {
        if success {
            self.status.send_replace(ConnectionStatus::Connected);
        } else {
            self.status.send_replace(ConnectionStatus::Error);
        }
    }

    /// Records an environment online/offline signal. Only edges produce a
    /// notification, and the connection status is left untouched.
    pub fn set_online(&self, online: bool) -> Option<Notification> {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        if was_online == online {
            return None;
        }

        if online {
            tracing::info!("Connection restored");
            return Some(Notification::new(NotificationKind::ConnectionRestored));
        }

        tracing::warn!("Connection lost");
        return Some(Notification::new(NotificationKind::ConnectionLost));
    }
}

impl Reachability for ConnectionMonitor {
    fn is_online(&self) -> bool {
        return self.online.load(Ordering::SeqCst);
    }
}
