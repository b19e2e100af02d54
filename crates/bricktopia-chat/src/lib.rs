//! Room chat for Bricktopia.
//!
//! Two pieces, both owned per room by the room registry:
//!
//! - [`ChatLog`]: the bounded message buffer. Oldest entries are evicted
//!   first. Serves full-history snapshots and cursor-based polling.
//! - [`Subscribers`]: the push connections currently listening to the
//!   room, with best-effort fan-out that never blocks the caller.
//!
//! Neither type locks anything. The registry serializes access; callers
//! snapshot subscriber senders and deliver after releasing the lock.

mod config;
mod error;
mod log;
mod subscribers;

pub use config::ChatConfig;
pub use error::ChatError;
pub use log::{Author, ChatLog, Poll};
pub use subscribers::{
    Broadcast, PushSender, SubscriberId, Subscribers, deliver,
};
