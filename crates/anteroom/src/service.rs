//! `LobbyService` builder and request dispatch.
//!
//! This is the boundary request handlers call once they have decoded a
//! request and authenticated its sender. It ties the registry to the
//! typed command enum: [`LobbyRequest`] in, [`LobbyResponse`] out.

use std::sync::Arc;

use anteroom_protocol::{LobbyRequest, LobbyResponse, PlayerId};
use anteroom_room::{Notifier, ProfileLookup, RoomConfig, RoomError, RoomRegistry};

use crate::LobbyConfig;

/// Builder for configuring a [`LobbyService`].
///
/// # Example
///
/// ```rust
/// use anteroom::prelude::*;
///
/// let (notifier, _events) = ChannelNotifier::new();
/// let lobby = LobbyService::builder()
///     .room_config(RoomConfig::default())
///     .build(notifier, PlaceholderProfiles);
///
/// let response = lobby.handle(PlayerId(1), LobbyRequest::ListRooms);
/// assert_eq!(response, LobbyResponse::RoomList { rooms: vec![] });
/// ```
#[derive(Debug, Clone, Default)]
pub struct LobbyServiceBuilder {
    room_config: RoomConfig,
}

impl LobbyServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the settings applied to every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Takes the room settings from a loaded config file.
    pub fn config(self, config: &LobbyConfig) -> Self {
        self.room_config(config.room_config())
    }

    /// Builds the service around the given collaborators.
    pub fn build<N: Notifier, P: ProfileLookup>(self, notifier: N, profiles: P) -> LobbyService<N, P> {
        tracing::info!(
            max_players = self.room_config.max_players,
            ready_timeout = ?self.room_config.ready_timeout,
            "lobby service ready"
        );
        LobbyService {
            registry: Arc::new(RoomRegistry::new(self.room_config, notifier, profiles)),
        }
    }
}

/// The lobby, shared by every request handler.
///
/// Cloning is cheap and every clone serves the same registry.
pub struct LobbyService<N: Notifier, P: ProfileLookup> {
    registry: Arc<RoomRegistry<N, P>>,
}

impl<N: Notifier, P: ProfileLookup> Clone for LobbyService<N, P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl LobbyService<anteroom_room::ChannelNotifier, anteroom_room::PlaceholderProfiles> {
    /// Creates a new builder.
    pub fn builder() -> LobbyServiceBuilder {
        LobbyServiceBuilder::new()
    }
}

impl<N: Notifier, P: ProfileLookup> LobbyService<N, P> {
    /// Direct access to the registry, for callers that want typed results.
    pub fn registry(&self) -> &RoomRegistry<N, P> {
        &self.registry
    }

    /// Runs one request on behalf of `player`.
    ///
    /// Rejections come back as [`LobbyResponse::Error`]; this never fails.
    /// `StartGame` arms the ready timeout, so call this from inside a
    /// Tokio runtime.
    pub fn handle(&self, player: PlayerId, request: LobbyRequest) -> LobbyResponse {
        match self.dispatch(player, request) {
            Ok(response) => response,
            Err(err) => {
                let code = err.code();
                tracing::debug!(player_id = %player, ?code, error = %err, "request rejected");
                LobbyResponse::Error {
                    code,
                    message: err.to_string(),
                }
            }
        }
    }

    fn dispatch(&self, player: PlayerId, request: LobbyRequest) -> Result<LobbyResponse, RoomError> {
        let registry = &self.registry;
        let response = match request {
            LobbyRequest::CreateRoom { name, options } => LobbyResponse::RoomCreated {
                room: registry.create_room(player, name, options)?,
            },
            LobbyRequest::JoinRoom { room_id } => LobbyResponse::RoomJoined {
                room: registry.join_room(player, room_id)?,
            },
            LobbyRequest::LeaveRoom => {
                registry.leave_room(player)?;
                LobbyResponse::RoomLeft
            }
            LobbyRequest::ListRooms => LobbyResponse::RoomList {
                rooms: registry.list_rooms_excluding(player),
            },
            LobbyRequest::RoomInfo { room_id } => LobbyResponse::RoomInfo {
                room: registry.get_room(room_id)?,
            },
            LobbyRequest::StartGame => {
                registry.start_game(player)?;
                LobbyResponse::GameStarting
            }
            LobbyRequest::CancelStart => {
                registry.cancel_start(player)?;
                LobbyResponse::StartCancelled
            }
            LobbyRequest::PlayerReady { token } => {
                registry.player_ready(player, &token)?;
                LobbyResponse::ReadyAccepted
            }
        };
        Ok(response)
    }
}
