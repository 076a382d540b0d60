//! Error types for the chat service.

use thiserror::Error;

/// Fixed advisory shown when the chat model cannot answer. The bracket
/// prefix makes canned turns easy to recognize in a transcript.
pub const CHAT_OFFLINE_ADVISORY: &str = "[assistant offline] The language model is unreachable \
     right now. The forecast above is still accurate; conversation will resume once the model \
     is back.";

/// Errors from talking to the chat service.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Chat service error: {0}")]
    Unavailable(String),

    #[error("Malformed chat response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ChatError {
    /// User-facing advisory text for this error.
    ///
    /// Every chat failure reads the same: the model is offline, the
    /// forecast is not.
    pub fn user_message(&self) -> &'static str {
        CHAT_OFFLINE_ADVISORY
    }
}
