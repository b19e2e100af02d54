//! Room chat over the shared registry: posting, history, polling and push.
//!
//! Each chat buffer belongs to its room's registry entry, so it is created
//! with the room and dropped with it. Push delivery snapshots the
//! subscriber senders under the lock and sends after releasing it.

use bricktopia_chat::{
    Author, Broadcast, ChatLog, Poll, PushSender, SubscriberId,
};
use bricktopia_protocol::{ChatKind, ChatMessage, PlayerId, PushFrame, RoomCode};

use crate::{RoomError, SharedRegistry, registry::RoomEntry};

#[derive(Clone)]
pub struct ChatChannel {
    registry: SharedRegistry,
}

impl ChatChannel {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Appends a message to the room's buffer and pushes it to every
    /// subscriber. The author must be a member of the room at the moment
    /// of posting.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`]
    /// - [`RoomError::Forbidden`] if the author is not a member
    /// - [`RoomError::Chat`] for an empty body or malformed colour
    pub async fn post(
        &self,
        code: &RoomCode,
        author: &Author,
        body: &str,
        kind: ChatKind,
        color: Option<&str>,
    ) -> Result<ChatMessage, RoomError> {
        let (message, broadcast) = {
            let mut registry = self.registry.lock().await;
            let entry = registry.entry_mut(code)?;
            require_member(entry, code, &author_id(author))?;
            let message = entry.chat.post(author, body, kind, color)?;
            let broadcast = pending(entry, &message, None);
            (message, broadcast)
        };
        broadcast.send();
        Ok(message)
    }

    /// Snapshot of the whole buffer, oldest first.
    pub async fn history(
        &self,
        code: &RoomCode,
    ) -> Result<Vec<ChatMessage>, RoomError> {
        let registry = self.registry.lock().await;
        Ok(registry.entry(code)?.chat.history())
    }

    /// Messages newer than `after`, at most the most recent `limit` of
    /// them, plus the cursor for the next poll. Counts as room activity.
    ///
    /// # Errors
    /// [`RoomError::NotFound`], or [`RoomError::Forbidden`] if `reader` is
    /// not a member.
    pub async fn poll(
        &self,
        code: &RoomCode,
        reader: &PlayerId,
        after: u64,
        limit: usize,
    ) -> Result<Poll, RoomError> {
        let mut registry = self.registry.lock().await;
        let entry = registry.entry_mut(code)?;
        require_member(entry, code, reader)?;
        let poll = entry.chat.poll(after, limit);
        registry.touch(code)?;
        Ok(poll)
    }

    /// Pushes an already-stored message to every subscriber except
    /// `exclude`. Best-effort: returns how many accepted it.
    pub async fn broadcast_push(
        &self,
        code: &RoomCode,
        message: &ChatMessage,
        exclude: Option<SubscriberId>,
    ) -> Result<usize, RoomError> {
        let broadcast = {
            let mut registry = self.registry.lock().await;
            pending(registry.entry_mut(code)?, message, exclude)
        };
        Ok(broadcast.send())
    }

    /// Registers a push connection for `author`.
    ///
    /// A "joined the chat" notice is stored, the new connection is sent a
    /// `history` frame (which already ends with that notice), and every
    /// other subscriber gets the notice as a `system` frame.
    ///
    /// # Errors
    /// [`RoomError::NotFound`], or [`RoomError::Forbidden`] if the author is
    /// not a member.
    pub async fn subscribe(
        &self,
        code: &RoomCode,
        author: &Author,
        sender: PushSender,
    ) -> Result<SubscriberId, RoomError> {
        let (id, broadcast) = {
            let mut registry = self.registry.lock().await;
            let entry = registry.entry_mut(code)?;
            let player = author_id(author);
            require_member(entry, code, &player)?;
            let notice = announce(&mut entry.chat, author, "joined")?;

            // The channel is fresh, so this can only fail if the receiver
            // is already gone, in which case the connection is over anyway.
            let _ = sender.try_send(PushFrame::History {
                messages: entry.chat.history(),
            });
            let id = entry.subscribers.subscribe(player, sender);
            (id, pending(entry, &notice, Some(id)))
        };
        tracing::info!(room = %code, player = %author.id, subscriber = %id, "push subscriber joined");
        broadcast.send();
        Ok(id)
    }

    /// Removes a push connection and tells the rest of the room.
    ///
    /// A no-op returning `false` if the room is gone or the subscription
    /// was already removed (for example because the player left the room).
    pub async fn unsubscribe(
        &self,
        code: &RoomCode,
        id: SubscriberId,
        author: &Author,
    ) -> bool {
        let broadcast = {
            let mut registry = self.registry.lock().await;
            let Ok(entry) = registry.entry_mut(code) else {
                return false;
            };
            if !entry.subscribers.unsubscribe(id) {
                return false;
            }
            match announce(&mut entry.chat, author, "left") {
                Ok(notice) => Some(pending(entry, &notice, None)),
                Err(_) => None,
            }
        };
        tracing::info!(room = %code, player = %author.id, subscriber = %id, "push subscriber left");
        if let Some(broadcast) = broadcast {
            broadcast.send();
        }
        true
    }
}

fn author_id(author: &Author) -> PlayerId {
    PlayerId::new(author.id.clone())
}

fn require_member(
    entry: &RoomEntry,
    code: &RoomCode,
    player: &PlayerId,
) -> Result<(), RoomError> {
    if entry.room.is_member(player) {
        Ok(())
    } else {
        Err(RoomError::Forbidden(format!("not a member of room {code}")))
    }
}

fn announce(
    chat: &mut ChatLog,
    author: &Author,
    verb: &str,
) -> Result<ChatMessage, RoomError> {
    Ok(chat.post(
        &Author::system(),
        &format!("{} {verb} the chat", author.name),
        ChatKind::System,
        None,
    )?)
}

fn pending(
    entry: &RoomEntry,
    message: &ChatMessage,
    exclude: Option<SubscriberId>,
) -> Broadcast {
    Broadcast::new(
        PushFrame::for_message(message.clone()),
        entry.subscribers.targets(exclude),
    )
}
