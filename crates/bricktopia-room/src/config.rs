//! Room and reaper configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for every room the registry creates, plus the reaper's
/// schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Maximum members per room, at most [`RoomConfig::PLAYER_CAP`].
    pub max_players: usize,

    /// Hard time-to-live of a room, counted from creation.
    pub max_age_secs: u64,

    /// How often the reaper sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: Self::PLAYER_CAP,
            max_age_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

impl RoomConfig {
    /// Hard ceiling on room size. Configs may lower it, never raise it.
    pub const PLAYER_CAP: usize = 8;

    pub fn reaper(&self) -> ReaperConfig {
        ReaperConfig {
            max_age: Duration::from_secs(self.max_age_secs),
            interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }
}

/// The reaper's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperConfig {
    /// Rooms older than this are removed, however busy they are.
    pub max_age: Duration,
    pub interval: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        RoomConfig::default().reaper()
    }
}
