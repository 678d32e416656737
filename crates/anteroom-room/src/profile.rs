//! Display identity lookup for players.
//!
//! The lobby never stores nicknames. Account data belongs to whatever
//! user service the deployment runs, so snapshots resolve nicknames
//! through the [`ProfileLookup`] trait at the moment they are built.

use anteroom_protocol::{PlayerId, PlayerInfo};

/// Resolves a player's display nickname.
///
/// # Trait bounds
///
/// - `Send + Sync` → the lookup is shared by every request handler.
/// - `'static` → it lives as long as the registry that owns it.
///
/// # Example
///
/// ```rust
/// use anteroom_protocol::PlayerId;
/// use anteroom_room::ProfileLookup;
///
/// struct Uppercase;
///
/// impl ProfileLookup for Uppercase {
///     fn nickname(&self, player: PlayerId) -> String {
///         format!("PLAYER-{}", player.0)
///     }
/// }
///
/// assert_eq!(Uppercase.player_info(PlayerId(7)).nickname, "PLAYER-7");
/// ```
pub trait ProfileLookup: Send + Sync + 'static {
    /// Returns the nickname shown to other players.
    ///
    /// Called while building snapshots, outside every lobby lock. It must
    /// not call back into the registry.
    fn nickname(&self, player: PlayerId) -> String;

    /// Pairs the id with its nickname.
    fn player_info(&self, player: PlayerId) -> PlayerInfo {
        PlayerInfo {
            user_id: player,
            nickname: self.nickname(player),
        }
    }
}

/// Lookup without a user service behind it: `"nickname {id}"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderProfiles;

impl ProfileLookup for PlaceholderProfiles {
    fn nickname(&self, player: PlayerId) -> String {
        format!("nickname {}", player.0)
    }
}
