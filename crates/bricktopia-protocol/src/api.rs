//! Request and response bodies for the HTTP surface.
//!
//! One schema per endpoint. Failures never reuse a success body: they are
//! always an [`ErrorBody`] carrying an [`ErrorKind`].

use serde::{Deserialize, Serialize};

use crate::{
    ChatKind, ChatMessage, ErrorKind, GameState, MessageId, PlayerId,
    RoomCode, RoomSummary, Visibility,
};

/// `POST /room`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub visibility: Visibility,
}

/// `POST /room/{code}/leave`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveResponse {
    /// `false` when the caller was not a member (the call is a no-op).
    pub left: bool,
}

/// `GET /rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomSummary>,
}

/// `POST /room/{code}/action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Echo of an accepted action plus the room's state afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub room_id: RoomCode,
    pub actor: PlayerId,
    pub kind: String,
    pub payload: serde_json::Value,
    pub state: GameState,
}

/// `POST /room/{code}/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostChatRequest {
    pub body: String,
    /// `chat` or `emote`. `system` is reserved for the server.
    #[serde(default)]
    pub kind: ChatKind,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostChatResponse {
    pub id: MessageId,
    pub timestamp: u64,
}

/// `GET /room/{code}/chat?after=..&limit=..`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollQuery {
    #[serde(default)]
    pub after: u64,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    pub messages: Vec<ChatMessage>,
    /// Newest timestamp in the whole buffer (0 when empty). The client's
    /// next `after` cursor.
    pub latest_timestamp: u64,
}

/// A frame sent by a client over the push connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientChatFrame {
    pub message: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub active_rooms: usize,
    pub active_players: usize,
}

/// Body of every failed request.
///
/// ```json
/// { "error": { "kind": "full", "message": "room k7xq2m is full" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                kind,
                message: message.into(),
            },
        }
    }
}
