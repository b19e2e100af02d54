//! The room registry: every live room, its chat, and the player→room index.
//!
//! All room and chat state lives here, behind one `tokio::sync::Mutex`
//! ([`SharedRegistry`]). Every mutation runs start-to-finish under that
//! lock, so no caller can observe a half-applied join or leave, and the
//! reaper can't race a concurrent join.
//!
//! # Invariants
//!
//! - a room always has at least one member; the last leave deletes it
//! - the host is always a member
//! - a player is indexed in at most one room, and is indexed iff they are
//!   a member of that room
//! - no room holds more than `max_players` members

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bricktopia_chat::{Author, Broadcast, ChatConfig, ChatLog, Subscribers};
use bricktopia_protocol::{
    ChatKind, GameState, PlayerId, PushFrame, RoomCode, RoomSummary,
    Visibility, unix_millis,
};
use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{ActionKind, Member, Room, RoomConfig, RoomError};

/// The registry as shared between request handlers, the chat channel and
/// the reaper.
pub type SharedRegistry = Arc<Mutex<RoomRegistry>>;

/// A room and everything that lives and dies with it.
pub(crate) struct RoomEntry {
    pub(crate) room: Room,
    pub(crate) chat: ChatLog,
    pub(crate) subscribers: Subscribers,
}

/// Outcome of [`RoomRegistry::remove_member`].
#[derive(Debug)]
pub enum Departure {
    /// The player wasn't a member. Nothing changed.
    NotMember,

    /// The player left and the room lives on.
    Left {
        /// Set when the leaver was host.
        new_host: Option<PlayerId>,
        /// "left the chat" notice for the remaining push subscribers, if
        /// the leaver had push connections open.
        notice: Option<Broadcast>,
    },

    /// The player was the last member. The room and its chat are gone.
    RoomClosed,
}

impl Departure {
    /// `true` unless the player wasn't a member.
    pub fn left(&self) -> bool {
        !matches!(self, Self::NotMember)
    }
}

pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomEntry>,
    /// Which room each player occupies.
    sessions: HashMap<PlayerId, RoomCode>,
    config: RoomConfig,
    chat_config: ChatConfig,
    next_seq: u64,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig, chat_config: ChatConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            sessions: HashMap::new(),
            config,
            chat_config,
            next_seq: 0,
        }
    }

    /// Wraps the registry for sharing across tasks.
    pub fn shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn chat_config(&self) -> &ChatConfig {
        &self.chat_config
    }

    /// Opens a room with `owner` as host and only member.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the owner already occupies a room.
    pub fn create(
        &mut self,
        owner: Member,
        visibility: Visibility,
    ) -> Result<&Room, RoomError> {
        if let Some(current) = self.sessions.get(&owner.id) {
            return Err(RoomError::AlreadyInRoom {
                player: owner.id.clone(),
                room: current.clone(),
            });
        }

        let code = self.fresh_code();
        let seq = self.next_seq;
        self.next_seq += 1;

        self.sessions.insert(owner.id.clone(), code.clone());
        tracing::info!(room = %code, host = %owner.id, ?visibility, "room created");

        let entry = RoomEntry {
            room: Room::new(
                code.clone(),
                owner,
                visibility,
                self.config.max_players,
                seq,
                unix_millis(),
            ),
            chat: ChatLog::new(code.clone(), &self.chat_config),
            subscribers: Subscribers::new(),
        };
        Ok(&self.rooms.entry(code).or_insert(entry).room)
    }

    /// Picks a code not used by any live room.
    fn fresh_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let code = RoomCode::from_indices(std::array::from_fn(|_| {
                rng.random_range(0..RoomCode::ALPHABET.len())
            }));
            if !self.rooms.contains_key(&code) {
                return code;
            }
            tracing::debug!(room = %code, "room code collision, retrying");
        }
    }

    pub fn get(&self, code: &RoomCode) -> Result<&Room, RoomError> {
        self.rooms
            .get(code)
            .map(|e| &e.room)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// The room `player` currently occupies.
    pub fn room_of(&self, player: &PlayerId) -> Option<&RoomCode> {
        self.sessions.get(player)
    }

    /// Seats `member` in room `code`.
    ///
    /// Joining a room you're already in succeeds and changes nothing, so
    /// retried requests are harmless.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the room doesn't exist
    /// - [`RoomError::AlreadyInRoom`] if the player occupies another room
    /// - [`RoomError::Full`] if the room is at capacity (nothing changes)
    pub fn add_member(
        &mut self,
        code: &RoomCode,
        member: Member,
    ) -> Result<&Room, RoomError> {
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        if let Some(current) = self.sessions.get(&member.id) {
            if current == code {
                return Ok(&entry.room);
            }
            return Err(RoomError::AlreadyInRoom {
                player: member.id.clone(),
                room: current.clone(),
            });
        }
        if entry.room.is_full() {
            return Err(RoomError::Full(code.clone()));
        }

        tracing::info!(room = %code, player = %member.id, "player joined room");
        self.sessions.insert(member.id.clone(), code.clone());
        entry.room.push_member(member);
        entry.room.touch(unix_millis());
        Ok(&entry.room)
    }

    /// Removes `player` from room `code`.
    ///
    /// Removing the last member deletes the room and its chat buffer.
    /// Removing the host hands the role to the earliest-joined remaining
    /// member. Any push connections the player had open to the room are
    /// closed.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room doesn't exist.
    pub fn remove_member(
        &mut self,
        code: &RoomCode,
        player: &PlayerId,
    ) -> Result<Departure, RoomError> {
        let entry = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let was_host = entry.room.host() == player;
        let Some(removed) = entry.room.remove_member(player) else {
            return Ok(Departure::NotMember);
        };
        self.sessions.remove(player);
        tracing::info!(room = %code, %player, "player left room");

        if entry.room.player_count() == 0 {
            self.destroy(code);
            return Ok(Departure::RoomClosed);
        }

        let new_host = was_host.then(|| entry.room.host().clone());
        if let Some(host) = &new_host {
            tracing::info!(room = %code, %host, "host transferred");
        }

        let notice = if entry.subscribers.remove_player(player) > 0 {
            entry
                .chat
                .post(
                    &Author::system(),
                    &format!("{} left the chat", removed.display_name),
                    ChatKind::System,
                    None,
                )
                .ok()
                .map(|msg| {
                    Broadcast::new(
                        PushFrame::for_message(msg),
                        entry.subscribers.targets(None),
                    )
                })
        } else {
            None
        };

        Ok(Departure::Left { new_host, notice })
    }

    /// Removes the room and un-indexes every member. Dropping the entry
    /// drops its chat buffer and subscriber senders.
    fn destroy(&mut self, code: &RoomCode) -> Option<RoomEntry> {
        let entry = self.rooms.remove(code)?;
        for member in entry.room.members() {
            self.sessions.remove(&member.id);
        }
        tracing::info!(
            room = %code,
            released = entry.room.player_count(),
            "room destroyed"
        );
        Some(entry)
    }

    /// Public, not-started rooms with a free seat, oldest first. Summaries
    /// only: no game state leaves through the listing.
    pub fn list_public_open(&self) -> Vec<RoomSummary> {
        let mut open: Vec<&Room> = self
            .rooms
            .values()
            .map(|e| &e.room)
            .filter(|r| r.is_open())
            .collect();
        open.sort_by_key(|r| r.age_order());
        open.into_iter().map(Room::summary).collect()
    }

    /// The open room quick-join should fill: fewest members, ties to the
    /// earliest created.
    pub fn least_full_open(&self) -> Option<RoomCode> {
        self.rooms
            .values()
            .map(|e| &e.room)
            .filter(|r| r.is_open())
            .min_by_key(|r| r.fill_order())
            .map(|r| r.code().clone())
    }

    pub fn touch(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        self.entry_mut(code)?.room.touch(unix_millis());
        Ok(())
    }

    /// Applies a member's action to the room state.
    ///
    /// Checks run in this order: room exists, caller is a member, kind is
    /// recognized, caller is host (for host-only kinds).
    ///
    /// # Errors
    /// - [`RoomError::NotFound`]
    /// - [`RoomError::Forbidden`] for non-members, or non-hosts starting
    /// - [`RoomError::UnknownAction`]
    pub fn apply_action(
        &mut self,
        code: &RoomCode,
        actor: &PlayerId,
        kind: &str,
        payload: serde_json::Value,
    ) -> Result<GameState, RoomError> {
        let entry = self.entry_mut(code)?;
        if !entry.room.is_member(actor) {
            return Err(RoomError::Forbidden(format!(
                "not a member of room {code}"
            )));
        }
        let kind = ActionKind::parse(kind)?;
        if kind.host_only() && entry.room.host() != actor {
            return Err(RoomError::Forbidden(format!(
                "only the host can {kind}"
            )));
        }

        entry.room.apply(actor, kind, payload, unix_millis());
        tracing::debug!(room = %code, player = %actor, %kind, "action applied");
        Ok(entry.room.state().clone())
    }

    /// Deletes every room created more than `max_age` before `now`,
    /// however active it is, releasing all of its members. Returns the
    /// codes removed.
    pub fn reap_expired(
        &mut self,
        max_age: Duration,
        now: Instant,
    ) -> Vec<RoomCode> {
        let expired: Vec<RoomCode> = self
            .rooms
            .values()
            .filter(|e| now.saturating_duration_since(e.room.created()) > max_age)
            .map(|e| e.room.code().clone())
            .collect();
        for code in &expired {
            self.destroy(code);
        }
        expired
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Players currently seated in any room.
    pub fn player_count(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn entry(&self, code: &RoomCode) -> Result<&RoomEntry, RoomError> {
        self.rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    pub(crate) fn entry_mut(
        &mut self,
        code: &RoomCode,
    ) -> Result<&mut RoomEntry, RoomError> {
        self.rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }
}
