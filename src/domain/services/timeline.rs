#[cfg(test)]
#[path = "timeline_test.rs"]
mod tests;

use crate::domain::models::Message;
use crate::domain::models::Sender;

/// Ordered log of the conversation. Entries are only ever appended, the whole
/// log can be cleared at once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    messages: Vec<Message>,
}

impl Timeline {
    pub fn new(messages: Vec<Message>) -> Timeline {
        return Timeline { messages };
    }

    pub fn append(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }

        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages = vec![];
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn len(&self) -> usize {
        return self.messages.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.messages.is_empty();
    }

    /// Most recent user text that can be sent again. Error entries are never
    /// part of a replay.
    pub fn last_user_text(&self) -> Option<&str> {
        return self
            .messages
            .iter()
            .rev()
            .find(|msg| return msg.sender == Sender::User && !msg.is_error())
            .map(|msg| return msg.text.as_str());
    }
}
