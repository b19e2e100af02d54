//! Error types for the session layer.

use bricktopia_protocol::PlayerId;

/// Errors from identity validation and profile lookups.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity service rejected the token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The token is not in a format this identity service understands.
    #[error("malformed token")]
    InvalidToken,

    /// A collaborator didn't answer within the configured timeout.
    #[error("{collaborator} timed out")]
    Timeout { collaborator: &'static str },

    /// A collaborator answered with a failure of its own.
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        collaborator: &'static str,
        reason: String,
    },

    /// The profile store has no entry for this player.
    #[error("no profile for player {0}")]
    ProfileNotFound(PlayerId),
}

impl SessionError {
    /// `true` when the caller's credentials are at fault, as opposed to
    /// the collaborator being slow or broken.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::AuthFailed(_) | Self::InvalidToken)
    }
}
