//! Error types for the room layer.

use bricktopia_chat::ChatError;
use bricktopia_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// Joining a room the player is already in is not here: it succeeds and
/// returns the room unchanged.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never did, emptied out, or was reaped).
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room is at capacity.
    #[error("room {0} is full")]
    Full(RoomCode),

    /// The player already occupies a different room.
    #[error("player {player} is already in room {room}")]
    AlreadyInRoom { player: PlayerId, room: RoomCode },

    /// The player doesn't occupy any room.
    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    /// The caller isn't allowed to do this (not a member, not the host).
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error(transparent)]
    Chat(#[from] ChatError),
}
