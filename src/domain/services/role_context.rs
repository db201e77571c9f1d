#[cfg(test)]
#[path = "role_context_test.rs"]
mod tests;

use crate::domain::models::Notification;
use crate::domain::models::NotificationKind;
use crate::domain::models::Role;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleContext {
    role: Option<Role>,
}

impl RoleContext {
    pub fn new(role: Option<Role>) -> RoleContext {
        return RoleContext { role };
    }

    pub fn role(&self) -> Option<Role> {
        return self.role;
    }

    pub fn select(&mut self, role: Role) -> Notification {
        self.role = Some(role);
        return Notification::new(NotificationKind::RoleSelected(role));
    }

    pub fn clear(&mut self) {
        self.role = None;
    }

    /// Preset prompt menu for the current role, empty when no role is set.
    pub fn presets(&self) -> &'static [&'static str] {
        return match self.role {
            Some(role) => role.presets(),
            None => &[],
        };
    }
}
