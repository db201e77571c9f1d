use serde_json::json;
use tempfile::TempDir;

/// Scratch directory for storage tests, removed when dropped.
pub fn temp_storage_dir() -> TempDir {
    return tempfile::Builder::new()
        .prefix("emis-assistant-")
        .tempdir()
        .unwrap();
}

/// Body the assistant service answers `/api/chat` with.
pub fn chat_response_fixture(
    response: &str,
    detected_role: Option<&str>,
    confidence: Option<f64>,
) -> String {
    return json!({
        "response": response,
        "detected_role": detected_role,
        "confidence": confidence,
    })
    .to_string();
}

/// Stored timeline in the format written by the widget.
pub fn stored_messages_fixture() -> &'static str {
    return r#"
[
  {
    "text": "Hello! I'm the DTE EMIS assistant. How can I help you today?",
    "sender": "assistant",
    "timestamp": "2024-01-15T10:00:00Z",
    "role_hint": null,
    "status": "ok"
  },
  {
    "text": "How do I log in to DTE EMIS?",
    "sender": "user",
    "timestamp": "2024-01-15T10:00:05Z",
    "role_hint": "general",
    "status": "ok"
  },
  {
    "text": "Go to https://emis.dtemaharashtra.gov.in/ and use your assigned credentials to log in.",
    "sender": "assistant",
    "timestamp": "2024-01-15T10:00:06Z",
    "role_hint": "general",
    "confidence": 0.95,
    "status": "ok"
  }
]
"#
    .trim();
}

/// Deterministic spread of confidences in `[0, 1]`, including values whose
/// shortest decimal form needs all 17 significant digits.
pub fn confidence_samples(count: usize) -> Vec<f64> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut samples = vec![0.0, 1.0, 0.9];
    while samples.len() < count {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        samples.push((state >> 11) as f64 / (1u64 << 53) as f64);
    }

    return samples;
}
