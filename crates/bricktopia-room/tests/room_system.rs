//! Integration tests for the room system: registry, matchmaking, chat and
//! reaper working against one shared registry.

use std::time::Duration;

use bricktopia_chat::{Author, ChatConfig};
use bricktopia_protocol::{ChatKind, PlayerId, PushFrame, RoomCode, Visibility};
use bricktopia_room::{
    ChatChannel, Matchmaker, Member, Reaper, ReaperConfig, RoomConfig,
    RoomError, RoomRegistry, SharedRegistry,
};
use rand::Rng;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn pid(id: &str) -> PlayerId {
    PlayerId::new(id)
}

fn member(id: &str) -> Member {
    Member::new(pid(id), format!("{id}-name"))
}

struct System {
    registry: SharedRegistry,
    matchmaker: Matchmaker,
    chat: ChatChannel,
}

fn system() -> System {
    system_with(RoomConfig::default(), ChatConfig::default())
}

fn system_with(rooms: RoomConfig, chat: ChatConfig) -> System {
    let registry = RoomRegistry::new(rooms, chat).shared();
    System {
        matchmaker: Matchmaker::new(registry.clone()),
        chat: ChatChannel::new(registry.clone()),
        registry,
    }
}

/// Checks every registry invariant for one room.
async fn assert_room_invariants(registry: &SharedRegistry, code: &RoomCode) {
    let registry = registry.lock().await;
    let Ok(room) = registry.get(code) else {
        return;
    };
    assert!(room.player_count() >= 1, "live room is empty");
    assert!(room.player_count() <= 8, "room over capacity");
    assert!(room.is_member(room.host()), "host is not a member");
    for m in room.members() {
        assert_eq!(registry.room_of(&m.id), Some(code), "member not indexed");
    }
}

// =========================================================================
// Membership
// =========================================================================

#[tokio::test]
async fn test_random_join_leave_sequence_preserves_invariants() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("p0"), Visibility::Public)
        .await
        .unwrap();
    let code = room.room_id;
    let mut rng = rand::rng();

    for _ in 0..500 {
        let who = format!("p{}", rng.random_range(0..12));
        if rng.random_bool(0.5) {
            let _ = sys.matchmaker.join_room(&code, member(&who)).await;
        } else {
            sys.matchmaker.leave(&code, &pid(&who)).await;
        }
        assert_room_invariants(&sys.registry, &code).await;
        if sys.registry.lock().await.get(&code).is_err() {
            break;
        }
    }
}

#[tokio::test]
async fn test_concurrent_joins_never_exceed_capacity() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("host"), Visibility::Public)
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let mm = sys.matchmaker.clone();
        let code = room.room_id.clone();
        tasks.push(tokio::spawn(async move {
            mm.join_room(&code, member(&format!("p{i}"))).await
        }));
    }
    let mut joined = 0;
    let mut full = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => joined += 1,
            Err(RoomError::Full(_)) => full += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(joined, 7);
    assert_eq!(full, 13);
    assert_room_invariants(&sys.registry, &room.room_id).await;
}

#[tokio::test]
async fn test_host_leaving_transfers_to_next_joined() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("a"), Visibility::Public)
        .await
        .unwrap();
    sys.matchmaker.join_room(&room.room_id, member("b")).await.unwrap();
    sys.matchmaker.join_room(&room.room_id, member("c")).await.unwrap();

    sys.matchmaker.leave_room(&pid("a")).await.unwrap();

    let registry = sys.registry.lock().await;
    assert_eq!(registry.get(&room.room_id).unwrap().host(), &pid("b"));
}

#[tokio::test]
async fn test_last_leave_deletes_room_and_chat() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("a"), Visibility::Public)
        .await
        .unwrap();
    sys.chat
        .post(&room.room_id, &Author::player(&pid("a"), "a"), "hello", ChatKind::Chat, None)
        .await
        .unwrap();

    sys.matchmaker.leave_room(&pid("a")).await.unwrap();

    assert!(matches!(
        sys.registry.lock().await.get(&room.room_id),
        Err(RoomError::NotFound(_))
    ));
    assert!(matches!(
        sys.chat.history(&room.room_id).await,
        Err(RoomError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_started_room_joinable_by_code_but_not_listed() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("a"), Visibility::Public)
        .await
        .unwrap();
    sys.registry
        .lock()
        .await
        .apply_action(&room.room_id, &pid("a"), "start_game", serde_json::Value::Null)
        .unwrap();

    assert!(sys.registry.lock().await.list_public_open().is_empty());
    let quick = sys.matchmaker.quick_join(member("b")).await.unwrap();
    assert_ne!(quick.room_id, room.room_id);

    sys.matchmaker.leave_room(&pid("b")).await.unwrap();
    let joined = sys.matchmaker.join_room(&room.room_id, member("b")).await.unwrap();
    assert_eq!(joined.members.len(), 2);
}

// =========================================================================
// Chat
// =========================================================================

#[tokio::test]
async fn test_chat_buffer_holds_last_hundred_newest_last() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("a"), Visibility::Public)
        .await
        .unwrap();
    let author = Author::player(&pid("a"), "a");

    for i in 0..101 {
        sys.chat
            .post(&room.room_id, &author, &format!("m{i}"), ChatKind::Chat, None)
            .await
            .unwrap();
    }

    let history = sys.chat.history(&room.room_id).await.unwrap();
    assert_eq!(history.len(), 100);
    assert_eq!(history.first().unwrap().body, "m1");
    assert_eq!(history.last().unwrap().body, "m100");
}

#[tokio::test]
async fn test_poll_cursor_is_lossless_across_rapid_posts() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("a"), Visibility::Public)
        .await
        .unwrap();
    let author = Author::player(&pid("a"), "a");

    let mut cursor = 0;
    let mut seen = Vec::new();
    for batch in 0..5 {
        for i in 0..7 {
            sys.chat
                .post(&room.room_id, &author, &format!("{batch}-{i}"), ChatKind::Chat, None)
                .await
                .unwrap();
        }
        let poll = sys.chat.poll(&room.room_id, &pid("a"), cursor, 100).await.unwrap();
        assert!(poll.messages.iter().all(|m| m.timestamp > cursor));
        seen.extend(poll.messages.into_iter().map(|m| m.body));
        cursor = poll.latest_timestamp;
    }

    assert_eq!(seen.len(), 35);
    let empty = sys.chat.poll(&room.room_id, &pid("a"), cursor, 100).await.unwrap();
    assert!(empty.messages.is_empty());
    assert_eq!(empty.latest_timestamp, cursor);
}

#[tokio::test]
async fn test_push_join_leave_notices_are_persisted_and_capped() {
    let sys = system_with(
        RoomConfig::default(),
        ChatConfig {
            history_capacity: 3,
            ..ChatConfig::default()
        },
    );
    let room = sys
        .matchmaker
        .create_room(member("a"), Visibility::Public)
        .await
        .unwrap();
    let author = Author::player(&pid("a"), "a-name");

    for _ in 0..3 {
        let (tx, _rx) = mpsc::channel(8);
        let id = sys.chat.subscribe(&room.room_id, &author, tx).await.unwrap();
        sys.chat.unsubscribe(&room.room_id, id, &author).await;
    }

    let history = sys.chat.history(&room.room_id).await.unwrap();
    let bodies: Vec<_> = history.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(
        bodies,
        vec!["a-name left the chat", "a-name joined the chat", "a-name left the chat"]
    );
}

#[tokio::test]
async fn test_slow_subscriber_does_not_block_others() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("a"), Visibility::Public)
        .await
        .unwrap();
    let author = Author::player(&pid("a"), "a");
    // Capacity 1, never drained: holds only its history frame.
    let (slow_tx, _slow_rx) = mpsc::channel(1);
    sys.chat.subscribe(&room.room_id, &author, slow_tx).await.unwrap();
    let (fast_tx, mut fast_rx) = mpsc::channel(64);
    sys.chat.subscribe(&room.room_id, &author, fast_tx).await.unwrap();

    for i in 0..10 {
        sys.chat
            .post(&room.room_id, &author, &format!("m{i}"), ChatKind::Chat, None)
            .await
            .unwrap();
    }

    let mut chat_frames = 0;
    while let Ok(frame) = fast_rx.try_recv() {
        if matches!(frame, PushFrame::Chat(_)) {
            chat_frames += 1;
        }
    }
    assert_eq!(chat_frames, 10);
}

// =========================================================================
// Reaper
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_reaper_releases_sessions_of_expired_rooms() {
    let sys = system();
    let room = sys
        .matchmaker
        .create_room(member("a"), Visibility::Public)
        .await
        .unwrap();
    sys.matchmaker.join_room(&room.room_id, member("b")).await.unwrap();
    let handle = Reaper::spawn(
        sys.registry.clone(),
        ReaperConfig {
            max_age: Duration::from_secs(60),
            interval: Duration::from_secs(10),
        },
    );

    tokio::time::sleep(Duration::from_secs(75)).await;

    // Both players are free to start over.
    assert!(sys.matchmaker.create_room(member("a"), Visibility::Public).await.is_ok());
    assert!(sys.matchmaker.create_room(member("b"), Visibility::Public).await.is_ok());
    assert!(sys.registry.lock().await.get(&room.room_id).is_err());
    handle.shutdown().await;
}
