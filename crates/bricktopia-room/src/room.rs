//! A single room: its members, host, and game state bag.
//!
//! `Room` only enforces its own invariants (host is a member, members are
//! unique and in join order). Capacity, the session index and locking
//! belong to the [`RoomRegistry`](crate::RoomRegistry).

use bricktopia_protocol::{
    GameState, LastAction, MemberView, PlayerId, RoomCode, RoomDetail,
    RoomSummary, Visibility,
};
use tokio::time::Instant;

use crate::ActionKind;

/// A room member and the name shown for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: PlayerId,
    pub display_name: String,
}

impl Member {
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host: PlayerId,
    /// Join order. Never empty while the room exists.
    members: Vec<Member>,
    visibility: Visibility,
    max_players: usize,
    /// Monotonic creation time, used for reaping and quick-join ties.
    created: Instant,
    /// Creation order within the registry. Breaks ties between rooms
    /// created in the same instant.
    seq: u64,
    created_at_ms: u64,
    last_activity_ms: u64,
    state: GameState,
}

impl Room {
    pub(crate) fn new(
        code: RoomCode,
        owner: Member,
        visibility: Visibility,
        max_players: usize,
        seq: u64,
        now_ms: u64,
    ) -> Self {
        Self {
            code,
            host: owner.id.clone(),
            members: vec![owner],
            visibility,
            max_players,
            created: Instant::now(),
            seq,
            created_at_ms: now_ms,
            last_activity_ms: now_ms,
            state: GameState::default(),
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, player: &PlayerId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == player)
    }

    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.member(player).is_some()
    }

    pub fn player_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_players
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn created(&self) -> Instant {
        self.created
    }

    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    /// Listed publicly and eligible for quick-join: public, not started,
    /// with a free seat.
    pub fn is_open(&self) -> bool {
        self.visibility.is_public() && !self.state.started && !self.is_full()
    }

    /// Sort key for listings: oldest first.
    pub(crate) fn age_order(&self) -> (Instant, u64) {
        (self.created, self.seq)
    }

    /// Sort key for quick-join: fewest members, then oldest.
    pub(crate) fn fill_order(&self) -> (usize, Instant, u64) {
        (self.members.len(), self.created, self.seq)
    }

    pub(crate) fn push_member(&mut self, member: Member) {
        self.members.push(member);
    }

    /// Removes `player`. If they were host, the earliest-joined remaining
    /// member takes over. Returns the removed member, or `None` if
    /// `player` wasn't here.
    pub(crate) fn remove_member(&mut self, player: &PlayerId) -> Option<Member> {
        let index = self.members.iter().position(|m| &m.id == player)?;
        let removed = self.members.remove(index);
        if &self.host == player {
            if let Some(next) = self.members.first() {
                self.host = next.id.clone();
            }
        }
        Some(removed)
    }

    pub(crate) fn touch(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    /// Applies an accepted action to the state bag. Permission checks are
    /// the caller's job.
    pub(crate) fn apply(
        &mut self,
        actor: &PlayerId,
        kind: ActionKind,
        payload: serde_json::Value,
        now_ms: u64,
    ) {
        match kind {
            ActionKind::StartGame => {
                self.state.started = true;
                self.state.started_at = Some(now_ms);
                self.state.turn = 0;
                self.state.scores = self
                    .members
                    .iter()
                    .map(|m| (m.id.clone(), 0))
                    .collect();
            }
            ActionKind::Move | ActionKind::Build | ActionKind::ChatEmote => {
                self.state.turn += 1;
            }
        }
        self.state.last_action = Some(LastAction {
            actor: actor.clone(),
            kind: kind.as_str().to_string(),
            payload,
            timestamp: now_ms,
        });
        self.touch(now_ms);
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.code.clone(),
            player_count: self.members.len(),
            max_players: self.max_players,
            created_at: self.created_at_ms,
        }
    }

    pub fn detail(&self) -> RoomDetail {
        RoomDetail {
            room_id: self.code.clone(),
            host: self.host.clone(),
            members: self
                .members
                .iter()
                .map(|m| MemberView {
                    id: m.id.clone(),
                    display_name: m.display_name.clone(),
                    is_host: m.id == self.host,
                })
                .collect(),
            visibility: self.visibility,
            max_players: self.max_players,
            created_at: self.created_at_ms,
            last_activity: self.last_activity_ms,
            state: self.state.clone(),
        }
    }
}
