//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings applied to every room the registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum occupancy, owner included.
    pub max_players: usize,

    /// How long players have to confirm a game start before the room
    /// falls back to `NotStarted`.
    pub ready_timeout: Duration,

    /// Bytes of entropy in each ready token. Tokens are hex encoded, so
    /// the token string is twice this long.
    pub token_bytes: usize,
}

impl RoomConfig {
    /// Default occupancy limit for new rooms.
    pub const DEFAULT_MAX_PLAYERS: usize = 4;
    /// Default time allowed for ready confirmations.
    pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(15);
    /// Default token entropy in bytes.
    pub const DEFAULT_TOKEN_BYTES: usize = 32;
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: Self::DEFAULT_MAX_PLAYERS,
            ready_timeout: Self::DEFAULT_READY_TIMEOUT,
            token_bytes: Self::DEFAULT_TOKEN_BYTES,
        }
    }
}
