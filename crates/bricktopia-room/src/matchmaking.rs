//! Matchmaking: how players get into (and out of) rooms.
//!
//! A stateless policy layer. Each operation takes the registry lock once
//! and does all of its reads and writes under it, so "find an open room,
//! then join it" can't be split by a concurrent join.

use bricktopia_protocol::{PlayerId, RoomCode, RoomDetail, Visibility};

use crate::{Departure, Member, RoomError, SharedRegistry};

/// Creates, joins and leaves rooms on behalf of players.
///
/// A player is never moved between rooms implicitly: asking for a
/// different room while seated is [`RoomError::AlreadyInRoom`].
#[derive(Clone)]
pub struct Matchmaker {
    registry: SharedRegistry,
}

impl Matchmaker {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if `owner` already occupies a room.
    pub async fn create_room(
        &self,
        owner: Member,
        visibility: Visibility,
    ) -> Result<RoomDetail, RoomError> {
        let mut registry = self.registry.lock().await;
        registry.create(owner, visibility).map(|room| room.detail())
    }

    /// # Errors
    /// - [`RoomError::NotFound`]
    /// - [`RoomError::Full`]
    /// - [`RoomError::AlreadyInRoom`] if seated in a different room
    pub async fn join_room(
        &self,
        code: &RoomCode,
        member: Member,
    ) -> Result<RoomDetail, RoomError> {
        let mut registry = self.registry.lock().await;
        registry.add_member(code, member).map(|room| room.detail())
    }

    /// Seats `member` in the least-full open public room, or opens a new
    /// public room if there is none. A player who is already seated gets
    /// their current room back.
    pub async fn quick_join(
        &self,
        member: Member,
    ) -> Result<RoomDetail, RoomError> {
        let mut registry = self.registry.lock().await;

        if let Some(current) = registry.room_of(&member.id).cloned() {
            return registry.get(&current).map(|room| room.detail());
        }

        match registry.least_full_open() {
            Some(code) => {
                tracing::debug!(room = %code, player = %member.id, "quick-join matched");
                registry.add_member(&code, member).map(|room| room.detail())
            }
            None => {
                tracing::debug!(player = %member.id, "quick-join found no open room");
                registry
                    .create(member, Visibility::Public)
                    .map(|room| room.detail())
            }
        }
    }

    /// Takes `player` out of whatever room they occupy.
    ///
    /// # Errors
    /// [`RoomError::NotInRoom`] if they don't occupy one.
    pub async fn leave_room(
        &self,
        player: &PlayerId,
    ) -> Result<RoomCode, RoomError> {
        let (code, departure) = {
            let mut registry = self.registry.lock().await;
            let code = registry
                .room_of(player)
                .cloned()
                .ok_or_else(|| RoomError::NotInRoom(player.clone()))?;
            let departure = registry.remove_member(&code, player)?;
            (code, departure)
        };
        announce(departure);
        Ok(code)
    }

    /// Takes `player` out of room `code`. Returns `false` when there was
    /// nothing to do: no such room, or not a member of it.
    pub async fn leave(&self, code: &RoomCode, player: &PlayerId) -> bool {
        let departure = {
            let mut registry = self.registry.lock().await;
            match registry.remove_member(code, player) {
                Ok(departure) => departure,
                Err(_) => return false,
            }
        };
        let left = departure.left();
        announce(departure);
        left
    }
}

/// Sends a departure's chat notice, after the registry lock is released.
fn announce(departure: Departure) {
    if let Departure::Left {
        notice: Some(notice),
        ..
    } = departure
    {
        notice.send();
    }
}

#[cfg(test)]
mod tests {
    use bricktopia_chat::ChatConfig;

    use super::*;
    use crate::{RoomConfig, RoomRegistry};

    fn pid(id: &str) -> PlayerId {
        PlayerId::new(id)
    }

    fn member(id: &str) -> Member {
        Member::new(pid(id), id)
    }

    fn matchmaker(max_players: usize) -> (Matchmaker, SharedRegistry) {
        let registry = RoomRegistry::new(
            RoomConfig {
                max_players,
                ..RoomConfig::default()
            },
            ChatConfig::default(),
        )
        .shared();
        (Matchmaker::new(registry.clone()), registry)
    }

    #[tokio::test]
    async fn test_quick_join_no_rooms_creates_one_then_fills_it() {
        let (mm, registry) = matchmaker(8);

        let first = mm.quick_join(member("a")).await.unwrap();
        let second = mm.quick_join(member("b")).await.unwrap();

        assert_eq!(first.room_id, second.room_id);
        assert_eq!(second.members.len(), 2);
        assert_eq!(registry.lock().await.room_count(), 1);
    }

    #[tokio::test]
    async fn test_quick_join_skips_private_rooms() {
        let (mm, registry) = matchmaker(8);
        let private = mm.create_room(member("a"), Visibility::Private).await.unwrap();

        let joined = mm.quick_join(member("b")).await.unwrap();

        assert_ne!(joined.room_id, private.room_id);
        assert_eq!(joined.visibility, Visibility::Public);
        assert_eq!(registry.lock().await.room_count(), 2);
    }

    #[tokio::test]
    async fn test_quick_join_picks_least_full_room() {
        let (mm, _) = matchmaker(8);
        let busy = mm.create_room(member("a"), Visibility::Public).await.unwrap();
        mm.join_room(&busy.room_id, member("b")).await.unwrap();
        let quiet = mm.create_room(member("c"), Visibility::Public).await.unwrap();

        let joined = mm.quick_join(member("d")).await.unwrap();

        assert_eq!(joined.room_id, quiet.room_id);
    }

    #[tokio::test]
    async fn test_quick_join_when_seated_returns_current_room() {
        let (mm, _) = matchmaker(8);
        let mine = mm.create_room(member("a"), Visibility::Private).await.unwrap();
        mm.create_room(member("b"), Visibility::Public).await.unwrap();

        let result = mm.quick_join(member("a")).await.unwrap();

        assert_eq!(result.room_id, mine.room_id);
    }

    #[tokio::test]
    async fn test_create_room_when_seated_is_rejected() {
        let (mm, _) = matchmaker(8);
        mm.create_room(member("a"), Visibility::Public).await.unwrap();

        let result = mm.create_room(member("a"), Visibility::Public).await;

        assert!(matches!(result, Err(RoomError::AlreadyInRoom { .. })));
    }

    #[tokio::test]
    async fn test_join_room_full_returns_full() {
        let (mm, _) = matchmaker(1);
        let room = mm.create_room(member("a"), Visibility::Public).await.unwrap();

        let result = mm.join_room(&room.room_id, member("b")).await;

        assert!(matches!(result, Err(RoomError::Full(_))));
    }

    #[tokio::test]
    async fn test_leave_room_not_seated_returns_not_in_room() {
        let (mm, _) = matchmaker(8);
        let result = mm.leave_room(&pid("nobody")).await;
        assert!(matches!(result, Err(RoomError::NotInRoom(_))));
    }

    #[tokio::test]
    async fn test_leave_room_frees_player_for_another_room() {
        let (mm, _) = matchmaker(8);
        let room = mm.create_room(member("a"), Visibility::Public).await.unwrap();

        let left = mm.leave_room(&pid("a")).await.unwrap();
        let again = mm.create_room(member("a"), Visibility::Public).await;

        assert_eq!(left, room.room_id);
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        let (mm, _) = matchmaker(8);
        let room = mm.create_room(member("a"), Visibility::Public).await.unwrap();
        mm.join_room(&room.room_id, member("b")).await.unwrap();

        assert!(mm.leave(&room.room_id, &pid("b")).await);
        assert!(!mm.leave(&room.room_id, &pid("b")).await);
        assert!(!mm.leave(&RoomCode::parse("zzzzzz").unwrap(), &pid("b")).await);
    }
}
