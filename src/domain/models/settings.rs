#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumString;
use strum::EnumVariantNames;

#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Widget preferences, independent of the conversation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub notifications: bool,
    pub sound_enabled: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Settings {
        return Settings {
            notifications: true,
            sound_enabled: true,
            theme: Theme::Light,
        };
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub notifications: Option<bool>,
    pub sound_enabled: Option<bool>,
    pub theme: Option<Theme>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        return self.notifications.is_none()
            && self.sound_enabled.is_none()
            && self.theme.is_none();
    }
}

impl Settings {
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(notifications) = patch.notifications {
            self.notifications = notifications;
        }
        if let Some(sound_enabled) = patch.sound_enabled {
            self.sound_enabled = sound_enabled;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
    }
}
