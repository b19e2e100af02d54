//! Push subscribers: the persistent connections listening to one room.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bricktopia_protocol::{PlayerId, PushFrame};
use tokio::sync::mpsc;

/// Counter for generating unique subscriber IDs.
static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Channel sender for delivering frames to one push connection.
///
/// Bounded: a connection that stops reading loses frames instead of
/// growing the server's memory.
pub type PushSender = mpsc::Sender<PushFrame>;

/// Opaque identifier for a push subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscriber {
    id: SubscriberId,
    player: PlayerId,
    sender: PushSender,
}

/// The push connections subscribed to one room.
///
/// Dropping this (when the room is destroyed) drops every sender, which
/// ends the connection tasks reading from the other side.
#[derive(Default)]
pub struct Subscribers {
    subscribers: Vec<Subscriber>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns its id.
    pub fn subscribe(
        &mut self,
        player: PlayerId,
        sender: PushSender,
    ) -> SubscriberId {
        let id = SubscriberId::next();
        self.subscribers.push(Subscriber { id, player, sender });
        id
    }

    /// Removes a connection. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Snapshot of senders to deliver to, minus `exclude`.
    ///
    /// Take this under the registry lock, then call [`deliver`] after
    /// releasing it.
    pub fn targets(&self, exclude: Option<SubscriberId>) -> Vec<PushSender> {
        self.subscribers
            .iter()
            .filter(|s| Some(s.id) != exclude)
            .map(|s| s.sender.clone())
            .collect()
    }

    /// Drops every connection held by `player`. Returns how many there were.
    pub fn remove_player(&mut self, player: &PlayerId) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| &s.player != player);
        before - self.subscribers.len()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

/// A frame and the senders it should reach, captured under the registry
/// lock and sent once the lock is released.
#[derive(Debug)]
#[must_use = "a broadcast does nothing until sent"]
pub struct Broadcast {
    frame: PushFrame,
    targets: Vec<PushSender>,
}

impl Broadcast {
    pub fn new(frame: PushFrame, targets: Vec<PushSender>) -> Self {
        Self { frame, targets }
    }

    /// Delivers the frame. Returns how many subscribers accepted it.
    pub fn send(self) -> usize {
        deliver(&self.targets, &self.frame)
    }
}

/// Best-effort fan-out. A full or closed channel drops that one frame and
/// delivery continues to the rest. Returns how many sends succeeded.
pub fn deliver(targets: &[PushSender], frame: &PushFrame) -> usize {
    let mut delivered = 0;
    for sender in targets {
        match sender.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("push subscriber lagging, frame dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
    delivered
}
