#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;

use super::Role;

#[derive(Clone, Debug, PartialEq)]
pub struct AssistantReply {
    pub text: String,
    pub role: Option<Role>,
    pub confidence: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

fn server_error_text(status: &u16, status_text: &str, detail: &Option<String>) -> String {
    let mut text = format!("The assistant service returned an error ({status} {status_text}).");
    if let Some(detail) = detail {
        text = format!("{text} {detail}");
    }

    return text;
}

/// Terminal outcome of a failed exchange. The display text is what ends up in
/// the error message shown in the timeline.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssistantError {
    #[error("The assistant took too long to respond. Please try again.")]
    Timeout,
    #[error("You appear to be offline. Check your connection and try again.")]
    Offline,
    #[error("{}", server_error_text(.status, .status_text, .detail))]
    ServerError {
        status: u16,
        status_text: String,
        detail: Option<String>,
    },
    #[error("Something went wrong: {message}")]
    Unknown { message: String },
}
