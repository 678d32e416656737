//! Lobby configuration loaded from TOML.
//!
//! Every key is optional; missing ones take the defaults of
//! [`RoomConfig`].
//!
//! ```toml
//! [rooms]
//! max_players = 4
//! ready_timeout_ms = 15000
//! token_bytes = 32
//!
//! [logging]
//! filter = "info,anteroom_room=debug"
//! ```

use std::path::Path;
use std::time::Duration;

use anteroom_room::RoomConfig;
use serde::{Deserialize, Serialize};

use crate::AnteroomError;

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LobbyConfig {
    pub rooms: RoomsSection,
    pub logging: LoggingSection,
}

/// `[rooms]`: applied to every room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoomsSection {
    pub max_players: usize,
    pub ready_timeout_ms: u64,
    pub token_bytes: usize,
}

impl Default for RoomsSection {
    fn default() -> Self {
        let defaults = RoomConfig::default();
        Self {
            max_players: defaults.max_players,
            ready_timeout_ms: u64::try_from(defaults.ready_timeout.as_millis())
                .unwrap_or(u64::MAX),
            token_bytes: defaults.token_bytes,
        }
    }
}

/// `[logging]`: the default `tracing` filter, used when `RUST_LOG` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl LobbyConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, AnteroomError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnteroomError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), "loaded lobby config");
        Ok(config)
    }

    /// The room settings this file describes.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            max_players: self.rooms.max_players,
            ready_timeout: Duration::from_millis(self.rooms.ready_timeout_ms),
            token_bytes: self.rooms.token_bytes,
        }
    }

    fn validate(&self) -> Result<(), AnteroomError> {
        if self.rooms.max_players == 0 {
            return Err(AnteroomError::InvalidConfig(
                "rooms.max_players must be at least 1".into(),
            ));
        }
        if self.rooms.ready_timeout_ms == 0 {
            return Err(AnteroomError::InvalidConfig(
                "rooms.ready_timeout_ms must be positive".into(),
            ));
        }
        if self.rooms.token_bytes < 16 {
            return Err(AnteroomError::InvalidConfig(
                "rooms.token_bytes must be at least 16".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = LobbyConfig::from_toml_str("").unwrap();
        assert_eq!(config, LobbyConfig::default());
        assert_eq!(config.room_config(), RoomConfig::default());
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_partial_rooms_section() {
        let config = LobbyConfig::from_toml_str(
            r#"
            [rooms]
            max_players = 8
            ready_timeout_ms = 250
            "#,
        )
        .unwrap();

        let rooms = config.room_config();
        assert_eq!(rooms.max_players, 8);
        assert_eq!(rooms.ready_timeout, Duration::from_millis(250));
        assert_eq!(rooms.token_bytes, RoomConfig::DEFAULT_TOKEN_BYTES);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = LobbyConfig::from_toml_str("[rooms]\nmax_player = 8\n");
        assert!(matches!(result, Err(AnteroomError::ConfigParse(_))));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = LobbyConfig::from_toml_str("[rooms]\nmax_players = 0\n");
        assert!(matches!(result, Err(AnteroomError::InvalidConfig(_))));
    }

    #[test]
    fn test_short_tokens_are_rejected() {
        let result = LobbyConfig::from_toml_str("[rooms]\ntoken_bytes = 4\n");
        assert!(matches!(result, Err(AnteroomError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = LobbyConfig::load("/definitely/not/here/anteroom.toml");
        assert!(matches!(result, Err(AnteroomError::Io(_))));
    }

    #[test]
    fn test_load_reads_file() {
        let path = std::env::temp_dir().join(format!(
            "anteroom-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[logging]\nfilter = \"debug\"\n").unwrap();

        let config = LobbyConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.logging.filter, "debug");
    }
}
