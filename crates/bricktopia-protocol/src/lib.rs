//! Wire protocol for Bricktopia.
//!
//! This crate defines the vocabulary every other layer shares:
//!
//! - **Identity types** ([`PlayerId`], [`RoomCode`], [`MessageId`]):
//!   newtypes so a room code can never be passed where a player is expected.
//! - **Data model** ([`GameState`], [`ChatMessage`], [`RoomDetail`], ...):
//!   the shapes that leave the server as JSON.
//! - **API bodies** ([`api`]): one request/response schema per endpoint.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become bytes.
//! - **Errors** ([`ProtocolError`], [`ErrorKind`]): decoding failures and
//!   the machine-readable error taxonomy sent to clients.
//!
//! # Architecture
//!
//! ```text
//! HTTP / WebSocket (bytes) → Protocol (typed bodies) → Gateway → Rooms / Chat
//! ```
//!
//! Nothing here knows about locks, rooms in memory, or connections.

mod codec;
mod error;
mod types;

pub mod api;

pub use codec::{Codec, JsonCodec};
pub use error::{ErrorKind, ProtocolError};
pub use types::{
    ChatKind, ChatMessage, GameState, LastAction, MemberView, MessageId,
    PlayerId, PushFrame, RoomCode, RoomDetail, RoomSummary, SYSTEM_AUTHOR,
    Visibility, unix_millis,
};
