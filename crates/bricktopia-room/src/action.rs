//! The actions a member can forward into a room.

use std::fmt;

use crate::RoomError;

/// A recognized action kind. Payloads are never interpreted; the kind
/// only decides permissions and bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Host only. Marks the game started.
    StartGame,
    Move,
    Build,
    ChatEmote,
}

impl ActionKind {
    /// # Errors
    /// [`RoomError::UnknownAction`] for anything that isn't a recognized
    /// kind. Matching is exact.
    pub fn parse(kind: &str) -> Result<Self, RoomError> {
        match kind {
            "start_game" => Ok(Self::StartGame),
            "move" => Ok(Self::Move),
            "build" => Ok(Self::Build),
            "chat_emote" => Ok(Self::ChatEmote),
            other => Err(RoomError::UnknownAction(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartGame => "start_game",
            Self::Move => "move",
            Self::Build => "build",
            Self::ChatEmote => "chat_emote",
        }
    }

    pub fn host_only(&self) -> bool {
        matches!(self, Self::StartGame)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        for kind in ["start_game", "move", "build", "chat_emote"] {
            assert_eq!(ActionKind::parse(kind).unwrap().as_str(), kind);
        }
    }

    #[test]
    fn test_parse_unknown_kind_is_error() {
        let err = ActionKind::parse("teleport").unwrap_err();
        assert!(matches!(err, RoomError::UnknownAction(k) if k == "teleport"));
        assert!(ActionKind::parse("Move").is_err());
    }

    #[test]
    fn test_only_start_game_is_host_only() {
        assert!(ActionKind::StartGame.host_only());
        assert!(!ActionKind::Move.host_only());
    }
}
