//! Rooms for Bricktopia: the registry, matchmaking, reaping and room chat.
//!
//! All state lives in one [`RoomRegistry`] behind a [`SharedRegistry`]
//! mutex. The other types are thin policy layers over it:
//!
//! - [`Matchmaker`]: create, join by code, quick-join, leave
//! - [`ChatChannel`]: post, history, poll, push subscriptions
//! - [`Reaper`]: background sweep enforcing a hard room TTL
//!
//! Rooms are plain data, not tasks. There is nothing to simulate; actions
//! are recorded into an opaque state bag and echoed back.

mod action;
mod channel;
mod config;
mod error;
mod matchmaking;
mod reaper;
mod registry;
mod room;

pub use action::ActionKind;
pub use channel::ChatChannel;
pub use config::{ReaperConfig, RoomConfig};
pub use error::RoomError;
pub use matchmaking::Matchmaker;
pub use reaper::{Reaper, ReaperHandle};
pub use registry::{Departure, RoomRegistry, SharedRegistry};
pub use room::{Member, Room};
