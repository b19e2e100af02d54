//! Chat buffer limits.

use serde::{Deserialize, Serialize};

/// Limits applied to every room's chat buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Messages retained per room. Older ones are evicted first.
    pub history_capacity: usize,

    /// Bodies longer than this many characters are truncated and
    /// suffixed with [`ChatConfig::TRUNCATION_MARKER`].
    pub max_body_chars: usize,

    /// Poll page size when the client doesn't ask for one.
    pub poll_limit_default: usize,

    /// Upper bound on a client-requested poll page size.
    pub poll_limit_max: usize,

    /// Frames queued per push connection before new frames are dropped.
    pub subscriber_buffer: usize,
}

impl ChatConfig {
    pub const TRUNCATION_MARKER: &'static str = "…";

    /// Clamps a client-requested poll limit into `1..=poll_limit_max`.
    pub fn poll_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.poll_limit_default)
            .clamp(1, self.poll_limit_max.max(1))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            max_body_chars: 500,
            poll_limit_default: 50,
            poll_limit_max: 100,
            subscriber_buffer: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_config_default() {
        let config = ChatConfig::default();
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.max_body_chars, 500);
    }

    #[test]
    fn test_poll_limit_clamps_requested_value() {
        let config = ChatConfig::default();
        assert_eq!(config.poll_limit(None), 50);
        assert_eq!(config.poll_limit(Some(0)), 1);
        assert_eq!(config.poll_limit(Some(7)), 7);
        assert_eq!(config.poll_limit(Some(10_000)), 100);
    }
}
