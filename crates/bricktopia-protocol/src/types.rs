//! Core protocol types: identities and the data model that leaves the server.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Author recorded on server-generated chat messages.
pub const SYSTEM_AUTHOR: &str = "system";

/// Milliseconds since the Unix epoch. All wire timestamps use this unit.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity as issued by the identity service.
///
/// Opaque to this service: it is only compared, hashed, and echoed back.
/// `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A display name derived from the id, used when the profile store
    /// can't be reached. Visibly distinct from any real name.
    pub fn placeholder_name(&self) -> String {
        let prefix: String = self.0.chars().take(8).collect();
        format!("player-{prefix}")
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A short, shareable room code such as `k7xq2m`.
///
/// Codes are [`RoomCode::LEN`] characters drawn from [`RoomCode::ALPHABET`],
/// which leaves out characters that are easy to misread (`0/o`, `1/l/i`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a room code.
    pub const LEN: usize = 6;

    /// Characters a room code may contain.
    pub const ALPHABET: &'static [u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

    /// Parses a client-supplied code. Input is trimmed and lowercased.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidRoomCode`] for the wrong length or any
    /// character outside the alphabet.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let code = input.trim().to_ascii_lowercase();
        let well_formed = code.len() == Self::LEN
            && code.bytes().all(|b| Self::ALPHABET.contains(&b));
        if !well_formed {
            return Err(ProtocolError::InvalidRoomCode(input.to_string()));
        }
        Ok(Self(code))
    }

    /// Builds a code from alphabet positions. Indices wrap around the
    /// alphabet, so any `usize` is accepted.
    pub fn from_indices(indices: [usize; Self::LEN]) -> Self {
        let code = indices
            .iter()
            .map(|i| Self::ALPHABET[i % Self::ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique id of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Whether a room shows up in the public listing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }
}

/// The most recent action forwarded into a room.
///
/// `payload` is opaque: stored and echoed, never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastAction {
    pub actor: PlayerId,
    pub kind: String,
    pub payload: serde_json::Value,
    pub timestamp: u64,
}

/// The per-room game state bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub started: bool,
    /// Unix millis when the host started the game.
    pub started_at: Option<u64>,
    pub turn: u64,
    pub scores: BTreeMap<PlayerId, i64>,
    pub last_action: Option<LastAction>,
}

/// Public listing entry. Deliberately carries no game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: RoomCode,
    pub player_count: usize,
    pub max_players: usize,
    pub created_at: u64,
}

/// One member as shown in a room detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    pub id: PlayerId,
    pub display_name: String,
    pub is_host: bool,
}

/// Full room view, for members and for public rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDetail {
    pub room_id: RoomCode,
    pub host: PlayerId,
    /// In join order.
    pub members: Vec<MemberView>,
    pub visibility: Visibility,
    pub max_players: usize,
    pub created_at: u64,
    pub last_activity: u64,
    pub state: GameState,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// What produced a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    #[default]
    Chat,
    System,
    Emote,
}

/// A message in a room's chat buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomCode,
    /// Player id, or [`SYSTEM_AUTHOR`].
    pub author: String,
    pub author_name: String,
    pub body: String,
    pub kind: ChatKind,
    /// Cosmetic `#rrggbb` colour chosen by the sender.
    pub color: String,
    /// Unix millis, strictly increasing within a room.
    pub timestamp: u64,
}

/// A frame pushed to a persistent chat connection.
///
/// Internally tagged so clients switch on `type`:
///
/// ```json
/// { "type": "history", "messages": [ ... ] }
/// { "type": "chat", "id": "...", "author": "...", "body": "hi", ... }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushFrame {
    /// Sent once, right after a connection subscribes.
    History { messages: Vec<ChatMessage> },
    Chat(ChatMessage),
    System(ChatMessage),
    Emote(ChatMessage),
}

impl PushFrame {
    /// Wraps a stored message in the frame matching its kind.
    pub fn for_message(message: ChatMessage) -> Self {
        match message.kind {
            ChatKind::Chat => Self::Chat(message),
            ChatKind::System => Self::System(message),
            ChatKind::Emote => Self::Emote(message),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
