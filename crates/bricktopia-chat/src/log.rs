//! The bounded per-room chat buffer.

use std::collections::VecDeque;

use bricktopia_protocol::{
    ChatKind, ChatMessage, MessageId, PlayerId, RoomCode, SYSTEM_AUTHOR,
    unix_millis,
};

use crate::{ChatConfig, ChatError};

const DEFAULT_COLOR: &str = "#ffffff";

/// Who a message is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
}

impl Author {
    pub fn player(id: &PlayerId, name: impl Into<String>) -> Self {
        Self {
            id: id.as_str().to_string(),
            name: name.into(),
        }
    }

    /// The server itself, for join/leave announcements.
    pub fn system() -> Self {
        Self {
            id: SYSTEM_AUTHOR.to_string(),
            name: "System".to_string(),
        }
    }
}

/// Result of [`ChatLog::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub messages: Vec<ChatMessage>,
    pub latest_timestamp: u64,
}

/// A room's chat buffer: the last `history_capacity` messages, oldest first.
///
/// Timestamps are strictly increasing within one log. When two posts land
/// in the same millisecond the second is stamped one millisecond later, so
/// a poll cursor never skips a message that shares its neighbour's time.
#[derive(Debug)]
pub struct ChatLog {
    room_id: RoomCode,
    messages: VecDeque<ChatMessage>,
    capacity: usize,
    max_body_chars: usize,
    last_timestamp: u64,
}

impl ChatLog {
    pub fn new(room_id: RoomCode, config: &ChatConfig) -> Self {
        Self {
            room_id,
            messages: VecDeque::with_capacity(config.history_capacity),
            capacity: config.history_capacity.max(1),
            max_body_chars: config.max_body_chars,
            last_timestamp: 0,
        }
    }

    /// Appends a message stamped with the current wall clock.
    ///
    /// # Errors
    /// - [`ChatError::EmptyBody`] for empty or whitespace-only bodies
    /// - [`ChatError::InvalidColor`] for a colour that isn't `#rrggbb`
    pub fn post(
        &mut self,
        author: &Author,
        body: &str,
        kind: ChatKind,
        color: Option<&str>,
    ) -> Result<ChatMessage, ChatError> {
        self.post_at(author, body, kind, color, unix_millis())
    }

    /// Like [`post`](Self::post) with an explicit clock reading.
    pub fn post_at(
        &mut self,
        author: &Author,
        body: &str,
        kind: ChatKind,
        color: Option<&str>,
        now_ms: u64,
    ) -> Result<ChatMessage, ChatError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ChatError::EmptyBody);
        }
        let color = match color {
            Some(c) if is_hex_color(c) => c.to_ascii_lowercase(),
            Some(c) => return Err(ChatError::InvalidColor(c.to_string())),
            None => DEFAULT_COLOR.to_string(),
        };

        let timestamp = now_ms.max(self.last_timestamp + 1);
        self.last_timestamp = timestamp;

        let message = ChatMessage {
            id: MessageId(uuid::Uuid::new_v4().to_string()),
            room_id: self.room_id.clone(),
            author: author.id.clone(),
            author_name: author.name.clone(),
            body: truncate(body, self.max_body_chars),
            kind,
            color,
            timestamp,
        };

        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message.clone());

        tracing::debug!(
            room = %self.room_id,
            author = %message.author,
            ?kind,
            buffered = self.messages.len(),
            "chat message stored"
        );
        Ok(message)
    }

    /// Every buffered message, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    /// Messages strictly newer than `after`, keeping only the most recent
    /// `limit` of them, plus the newest timestamp in the whole buffer.
    pub fn poll(&self, after: u64, limit: usize) -> Poll {
        // Timestamps are ordered, so the newer suffix starts at the
        // partition point.
        let start = self.messages.partition_point(|m| m.timestamp <= after);
        let newer: Vec<&ChatMessage> =
            self.messages.iter().skip(start).collect();
        let skip = newer.len().saturating_sub(limit);
        Poll {
            messages: newer.into_iter().skip(skip).cloned().collect(),
            latest_timestamp: self.latest_timestamp(),
        }
    }

    /// Timestamp of the newest buffered message, 0 when empty.
    pub fn latest_timestamp(&self) -> u64 {
        self.messages.back().map(|m| m.timestamp).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

fn truncate(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            format!("{}{}", &body[..cut], ChatConfig::TRUNCATION_MARKER)
        }
        None => body.to_string(),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with_capacity(capacity: usize) -> ChatLog {
        ChatLog::new(
            RoomCode::parse("abcdef").unwrap(),
            &ChatConfig {
                history_capacity: capacity,
                ..ChatConfig::default()
            },
        )
    }

    fn alice() -> Author {
        Author::player(&PlayerId::new("u-alice"), "alice")
    }

    fn post(log: &mut ChatLog, body: &str, now_ms: u64) -> ChatMessage {
        log.post_at(&alice(), body, ChatKind::Chat, None, now_ms)
            .expect("post should succeed")
    }

    // =====================================================================
    // post()
    // =====================================================================

    #[test]
    fn test_post_empty_body_returns_error_and_does_not_append() {
        let mut log = log_with_capacity(10);

        let empty = log.post(&alice(), "", ChatKind::Chat, None);
        let blank = log.post(&alice(), "  \n\t ", ChatKind::Chat, None);

        assert!(matches!(empty, Err(ChatError::EmptyBody)));
        assert!(matches!(blank, Err(ChatError::EmptyBody)));
        assert!(log.is_empty());
    }

    #[test]
    fn test_post_trims_body_and_defaults_color() {
        let mut log = log_with_capacity(10);
        let msg = post(&mut log, "  hi there  ", 1_000);
        assert_eq!(msg.body, "hi there");
        assert_eq!(msg.color, "#ffffff");
        assert_eq!(msg.author, "u-alice");
        assert_eq!(msg.author_name, "alice");
    }

    #[test]
    fn test_post_truncates_long_body_with_marker() {
        let mut log = ChatLog::new(
            RoomCode::parse("abcdef").unwrap(),
            &ChatConfig {
                max_body_chars: 5,
                ..ChatConfig::default()
            },
        );
        let msg = post(&mut log, "héllo world", 1);
        assert_eq!(msg.body, "héllo…");

        let exact = post(&mut log, "abcde", 2);
        assert_eq!(exact.body, "abcde");
    }

    #[test]
    fn test_post_default_cap_truncates_at_500_chars() {
        let mut log = log_with_capacity(10);
        let msg = post(&mut log, &"x".repeat(800), 1);
        assert_eq!(msg.body.chars().count(), 501);
        assert!(msg.body.ends_with('…'));
    }

    #[test]
    fn test_post_rejects_malformed_color() {
        let mut log = log_with_capacity(10);
        let result =
            log.post(&alice(), "hi", ChatKind::Chat, Some("red"));
        assert!(matches!(result, Err(ChatError::InvalidColor(_))));
        assert!(log.is_empty());

        let ok = log
            .post(&alice(), "hi", ChatKind::Chat, Some("#FFAA00"))
            .unwrap();
        assert_eq!(ok.color, "#ffaa00");
    }

    #[test]
    fn test_post_timestamps_strictly_increase_within_room() {
        let mut log = log_with_capacity(10);
        let a = post(&mut log, "a", 5_000);
        let b = post(&mut log, "b", 5_000);
        // Clock went backwards: still ordered.
        let c = post(&mut log, "c", 4_000);
        assert_eq!(a.timestamp, 5_000);
        assert_eq!(b.timestamp, 5_001);
        assert_eq!(c.timestamp, 5_002);
    }

    #[test]
    fn test_post_over_capacity_evicts_oldest() {
        let mut log = log_with_capacity(100);
        for i in 0..101 {
            post(&mut log, &format!("msg {i}"), 1_000 + i);
        }

        let history = log.history();
        assert_eq!(history.len(), 100);
        assert_eq!(history[0].body, "msg 1", "oldest should be evicted");
        assert_eq!(history[99].body, "msg 100", "newest should be last");
    }

    #[test]
    fn test_post_system_author() {
        let mut log = log_with_capacity(10);
        let msg = log
            .post(&Author::system(), "alice joined the chat", ChatKind::System, None)
            .unwrap();
        assert_eq!(msg.author, SYSTEM_AUTHOR);
        assert_eq!(msg.kind, ChatKind::System);
    }

    // =====================================================================
    // poll()
    // =====================================================================

    #[test]
    fn test_poll_empty_log_returns_zero_cursor() {
        let log = log_with_capacity(10);
        let poll = log.poll(0, 50);
        assert!(poll.messages.is_empty());
        assert_eq!(poll.latest_timestamp, 0);
    }

    #[test]
    fn test_poll_returns_only_strictly_newer_messages() {
        let mut log = log_with_capacity(10);
        post(&mut log, "a", 100);
        let b = post(&mut log, "b", 200);
        post(&mut log, "c", 300);

        let poll = log.poll(b.timestamp, 50);

        let bodies: Vec<_> = poll.messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["c"]);
        assert_eq!(poll.latest_timestamp, 300);
    }

    #[test]
    fn test_poll_keeps_most_recent_when_over_limit() {
        let mut log = log_with_capacity(10);
        for i in 0..6 {
            post(&mut log, &format!("m{i}"), 10 * (i + 1));
        }

        let poll = log.poll(0, 2);

        let bodies: Vec<_> = poll.messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["m4", "m5"]);
        assert_eq!(poll.latest_timestamp, 60);
    }

    #[test]
    fn test_poll_with_returned_cursor_has_no_overlap() {
        let mut log = log_with_capacity(10);
        post(&mut log, "a", 100);
        post(&mut log, "b", 200);

        let first = log.poll(0, 50);
        let second = log.poll(first.latest_timestamp, 50);

        assert_eq!(first.messages.len(), 2);
        assert!(second.messages.is_empty());
        assert_eq!(second.latest_timestamp, first.latest_timestamp);

        post(&mut log, "c", 300);
        let third = log.poll(second.latest_timestamp, 50);
        assert_eq!(third.messages.len(), 1);
        assert_eq!(third.messages[0].body, "c");
    }

    #[test]
    fn test_poll_after_eviction_wraps_ring_buffer() {
        let mut log = log_with_capacity(3);
        for i in 0..5 {
            post(&mut log, &format!("m{i}"), 100 + i);
        }
        let poll = log.poll(102, 50);
        let bodies: Vec<_> = poll.messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["m3", "m4"]);
    }
}
