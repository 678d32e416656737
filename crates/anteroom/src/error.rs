//! Unified error type for the Anteroom lobby.

use anteroom_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// Request handling never produces this: [`LobbyService::handle`]
/// turns every [`RoomError`] into an error response. It shows up when
/// loading configuration, or when callers drive the registry directly and
/// want one error type across both.
///
/// [`LobbyService::handle`]: crate::LobbyService::handle
#[derive(Debug, thiserror::Error)]
pub enum AnteroomError {
    /// A room-level error (full, not found, wrong state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The config file is not valid TOML or has the wrong shape.
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config parsed but a value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}
