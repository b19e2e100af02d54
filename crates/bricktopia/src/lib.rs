//! # Bricktopia
//!
//! Room, matchmaking and chat service for multiplayer web games.
//!
//! Players authenticate with a bearer token, then create, join or
//! quick-join rooms of up to eight, forward opaque game actions, and chat
//! by polling or over a WebSocket. Rooms live in memory only and are
//! reaped an hour after creation.
//!
//! The layers, leaves first:
//!
//! - `bricktopia-protocol`: ids and wire types
//! - `bricktopia-session`: identity and profile collaborators
//! - `bricktopia-chat`: per-room chat buffers and push fan-out
//! - `bricktopia-room`: registry, matchmaking, reaper, room chat
//! - this crate: the session gateway and its HTTP surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bricktopia::prelude::*;
//!
//! # async fn start() -> Result<(), BricktopiaError> {
//! let profiles = MemoryProfiles::new();
//! let identity = SignedTokenIdentity::new("secret").with_profiles(profiles.clone());
//! let server = BricktopiaServerBuilder::new()
//!     .bind("127.0.0.1:8080")
//!     .build(identity, profiles)
//!     .await?;
//! server.run().await
//! # }
//! ```

pub mod api;
pub mod config;
mod error;
pub mod gateway;
mod server;
mod ws;

pub use error::{ApiError, BricktopiaError};
pub use server::{BricktopiaServer, BricktopiaServerBuilder, build_app};

/// Common imports for running a server.
pub mod prelude {
    pub use crate::api::AppState;
    pub use crate::config::ServerConfig;
    pub use crate::gateway::SessionGateway;
    pub use crate::{
        ApiError, BricktopiaError, BricktopiaServer, BricktopiaServerBuilder, build_app,
    };

    pub use bricktopia_chat::ChatConfig;
    pub use bricktopia_protocol::api::*;
    pub use bricktopia_protocol::{
        ChatKind, ChatMessage, ErrorKind, PlayerId, PushFrame, RoomCode,
        RoomDetail, RoomSummary, Visibility,
    };
    pub use bricktopia_room::{RoomConfig, RoomRegistry};
    pub use bricktopia_session::{
        CollaboratorConfig, Collaborators, Identity, IdentityService,
        MemoryProfiles, ProfileStore, SessionError, SignedTokenIdentity,
    };
}
