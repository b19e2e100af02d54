//! Error types for the protocol layer.
//!
//! [`ProtocolError`] covers failures turning bytes into typed values.
//! [`ErrorKind`] is different: it is the stable, machine-readable tag that
//! clients branch on, shared by every layer that reports an error outward.

use serde::{Deserialize, Serialize};

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// wrong data types, or truncated messages.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code supplied by a client is not well-formed.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// The message is invalid at the protocol level.
    ///
    /// For values that deserialize fine but break a protocol rule,
    /// e.g. a colour that isn't `#rrggbb`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// The error taxonomy exposed to clients.
///
/// Serialized in `snake_case`, so `ErrorKind::AlreadyInRoom` travels as
/// `"already_in_room"`. New variants may be added; existing tags never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Full,
    AlreadyInRoom,
    NotInRoom,
    Forbidden,
    UnknownAction,
    EmptyBody,
    CollaboratorUnavailable,
    InvalidInput,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    /// Returns the wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Full => "full",
            Self::AlreadyInRoom => "already_in_room",
            Self::NotInRoom => "not_in_room",
            Self::Forbidden => "forbidden",
            Self::UnknownAction => "unknown_action",
            Self::EmptyBody => "empty_body",
            Self::CollaboratorUnavailable => "collaborator_unavailable",
            Self::InvalidInput => "invalid_input",
            Self::Unauthorized => "unauthorized",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
