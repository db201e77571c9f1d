#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::AssistantReply;
use super::Role;
use super::Sender;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Ok,
    Error,
}

/// One turn of the conversation as shown in the chat dialog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub role_hint: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub status: MessageStatus,
}

impl Message {
    /// User authored message. The text is kept verbatim for display, trimming
    /// only happens when it is sent to the assistant.
    pub fn from_user(text: &str, role_hint: Option<Role>) -> Message {
        return Message {
            text: text.to_string(),
            sender: Sender::User,
            timestamp: Utc::now(),
            role_hint,
            confidence: None,
            status: MessageStatus::Ok,
        };
    }

    pub fn from_assistant(text: &str) -> Message {
        return Message {
            text: text.to_string(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            role_hint: None,
            confidence: None,
            status: MessageStatus::Ok,
        };
    }

    pub fn from_reply(reply: AssistantReply) -> Message {
        return Message {
            text: reply.text,
            sender: Sender::Assistant,
            timestamp: reply.timestamp,
            role_hint: reply.role,
            confidence: reply.confidence,
            status: MessageStatus::Ok,
        };
    }

    pub fn new_error(description: &str) -> Message {
        return Message {
            text: description.to_string(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            role_hint: None,
            confidence: None,
            status: MessageStatus::Error,
        };
    }

    pub fn is_error(&self) -> bool {
        return self.status == MessageStatus::Error;
    }

    /// Single line rendering used by the terminal front end and plain text
    /// exports.
    pub fn as_line(&self) -> String {
        let mut line = format!("{}: {}", self.sender, self.text);
        if let Some(role) = self.role_hint {
            line = format!("{line} [{role}]");
        }
        if let Some(confidence) = self.confidence {
            line = format!("{line} ({:.0}%)", confidence * 100.0);
        }

        return line;
    }
}
