//! Server configuration, loaded from `bricktopia.toml` with environment
//! overrides.

use std::net::SocketAddr;
use std::path::Path;

use bricktopia_chat::ChatConfig;
use bricktopia_room::RoomConfig;
use bricktopia_session::CollaboratorConfig;
use serde::Deserialize;

/// Path of the config file when `BRICKTOPIA_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "bricktopia.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub rooms: RoomConfig,
    pub chat: ChatConfig,
    pub collaborators: CollaboratorConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            rooms: RoomConfig::default(),
            chat: ChatConfig::default(),
            collaborators: CollaboratorConfig::default(),
            auth: AuthConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Identity token settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signed identity tokens. When unset the binary
    /// generates an ephemeral one at startup.
    pub token_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted request body. Bigger bodies get 413.
    pub max_payload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 16 * 1024,
        }
    }
}

impl ServerConfig {
    /// Loads the file named by `BRICKTOPIA_CONFIG` (or
    /// [`DEFAULT_CONFIG_PATH`]), then applies environment overrides.
    ///
    /// A missing file is not an error: defaults are used. A file that
    /// exists but does not parse is.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("BRICKTOPIA_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml_str(&content)?;
                tracing::info!(path = %path.display(), "loaded configuration");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if let Some(addr) = non_empty_env("BRICKTOPIA_LISTEN") {
            self.listen_addr = addr;
        }
        if let Some(secret) = non_empty_env("BRICKTOPIA_TOKEN_SECRET") {
            self.auth.token_secret = Some(secret);
        }
        if let Some(ms) = non_empty_env("BRICKTOPIA_COLLABORATOR_TIMEOUT_MS") {
            match ms.parse() {
                Ok(ms) => self.collaborators.timeout_ms = ms,
                Err(_) => tracing::warn!(value = %ms, "ignoring unparseable BRICKTOPIA_COLLABORATOR_TIMEOUT_MS"),
            }
        }
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        let checks = [
            (self.rooms.max_players == 0, "rooms.max_players must be > 0"),
            (
                self.rooms.max_players > RoomConfig::PLAYER_CAP,
                "rooms.max_players must be <= 8",
            ),
            (self.rooms.max_age_secs == 0, "rooms.max_age_secs must be > 0"),
            (
                self.rooms.sweep_interval_secs == 0,
                "rooms.sweep_interval_secs must be > 0",
            ),
            (
                self.chat.history_capacity == 0,
                "chat.history_capacity must be > 0",
            ),
            (self.chat.max_body_chars == 0, "chat.max_body_chars must be > 0"),
            (
                self.chat.poll_limit_max == 0,
                "chat.poll_limit_max must be > 0",
            ),
            (
                self.chat.subscriber_buffer == 0,
                "chat.subscriber_buffer must be > 0",
            ),
            (
                self.collaborators.timeout_ms == 0,
                "collaborators.timeout_ms must be > 0",
            ),
            (
                self.limits.max_payload_bytes == 0,
                "limits.max_payload_bytes must be > 0",
            ),
        ];
        for (failed, message) in checks {
            if failed {
                return Err(ConfigError::Invalid(message.to_string()));
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "listen_addr {:?} is not a socket address",
                self.listen_addr
            ))
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.rooms.max_players, 8);
        assert_eq!(cfg.rooms.max_age_secs, 3600);
        assert_eq!(cfg.chat.history_capacity, 100);
        assert_eq!(cfg.collaborators.timeout_ms, 3000);
        assert!(cfg.auth.token_secret.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str_partial_sections_keep_defaults() {
        let cfg = ServerConfig::from_toml_str(
            r#"
            listen_addr = "127.0.0.1:9000"

            [rooms]
            max_players = 4

            [chat]
            max_body_chars = 200
            "#,
        )
        .unwrap();

        assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
        assert_eq!(cfg.rooms.max_players, 4);
        assert_eq!(cfg.rooms.sweep_interval_secs, 300);
        assert_eq!(cfg.chat.max_body_chars, 200);
        assert_eq!(cfg.chat.history_capacity, 100);
        assert_eq!(cfg.limits.max_payload_bytes, 16 * 1024);
    }

    #[test]
    fn test_from_toml_str_bad_type_is_parse_error() {
        let result = ServerConfig::from_toml_str("[rooms]\nmax_players = \"many\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_listen_addr() {
        let cfg = ServerConfig {
            listen_addr: "not an address".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut cfg = ServerConfig::default();
        cfg.rooms.max_players = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("rooms.max_players"));
    }

    #[test]
    fn test_validate_rejects_room_size_above_cap() {
        let mut cfg = ServerConfig::default();
        cfg.rooms.max_players = RoomConfig::PLAYER_CAP;
        assert!(cfg.validate().is_ok());

        cfg.rooms.max_players = 9;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("rooms.max_players must be <= 8"));
    }

    #[test]
    fn test_from_file_missing_uses_defaults() {
        let cfg = ServerConfig::from_file(Path::new("/nonexistent/bricktopia.toml")).unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
    }
}
