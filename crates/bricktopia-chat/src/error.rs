//! Error types for the chat layer.

/// Errors that can occur when posting to a chat log.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The body was empty or only whitespace.
    #[error("message body is empty")]
    EmptyBody,

    /// The colour is not a `#rrggbb` hex string.
    #[error("invalid colour {0:?}, expected #rrggbb")]
    InvalidColor(String),
}
