use serde::{Deserialize, Serialize};

/// Application error body carried by upstream `{ "error": { ... } }` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Parses an upstream error body, falling back to the raw text (or the given
/// status line) when the body is not a well-formed envelope.
pub fn decode_error_body(body: &str, status_line: &str) -> (Option<String>, String) {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (Some(envelope.error.code), envelope.error.message),
        Err(_) if !body.trim().is_empty() => (None, body.trim().to_string()),
        Err(_) => (None, status_line.to_string()),
    }
}
