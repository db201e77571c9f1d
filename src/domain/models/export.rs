#[cfg(test)]
#[path = "export_test.rs"]
mod tests;

use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Message;
use super::Role;

/// Transportable snapshot of a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryExport {
    pub messages: Vec<Message>,
    pub role: Option<Role>,
    pub export_timestamp: DateTime<Utc>,
}

impl HistoryExport {
    pub fn new(messages: Vec<Message>, role: Option<Role>) -> HistoryExport {
        return HistoryExport {
            messages,
            role,
            export_timestamp: Utc::now(),
        };
    }

    pub fn to_document(&self) -> Result<String> {
        return Ok(serde_json::to_string_pretty(self)?);
    }

    pub fn from_document(document: &str) -> Result<HistoryExport> {
        return Ok(serde_json::from_str(document)?);
    }
}
