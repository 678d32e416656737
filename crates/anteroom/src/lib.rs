//! # Anteroom
//!
//! Session coordination for multiplayer game lobbies.
//!
//! Players create and join rooms, the owner starts the game, and every
//! other member confirms with a one-time token before the room moves to
//! `InProgress`. Unconfirmed starts time out and roll back.
//!
//! Transport, authentication and event delivery stay outside: the host
//! decodes requests into [`LobbyRequest`](anteroom_protocol::LobbyRequest),
//! calls [`LobbyService::handle`], and drains lobby events from its
//! [`Notifier`](anteroom_room::Notifier).
//!
//! ## Quick Start
//!
//! ```rust
//! use anteroom::prelude::*;
//!
//! let (notifier, mut events) = ChannelNotifier::new();
//! let lobby = LobbyService::builder().build(notifier, PlaceholderProfiles);
//!
//! let created = lobby.handle(
//!     PlayerId(1),
//!     LobbyRequest::CreateRoom { name: "friday".into(), options: RoomOptions::default() },
//! );
//! let LobbyResponse::RoomCreated { room } = created else { panic!() };
//!
//! lobby.handle(PlayerId(2), LobbyRequest::JoinRoom { room_id: room.id });
//! let joined = events.try_recv().unwrap();
//! assert_eq!(joined.recipients, vec![PlayerId(1)]);
//! ```

mod config;
mod error;
mod service;

pub use config::{LobbyConfig, LoggingSection, RoomsSection};
pub use error::AnteroomError;
pub use service::{LobbyService, LobbyServiceBuilder};

/// Common imports for hosting a lobby.
pub mod prelude {
    pub use crate::{AnteroomError, LobbyConfig, LobbyService, LobbyServiceBuilder};
    pub use anteroom_protocol::{
        ErrorCode, LobbyEvent, LobbyRequest, LobbyResponse, PlayerId, PlayerInfo, RoomId,
        RoomOptions, RoomSnapshot, RoomStatus,
    };
    pub use anteroom_room::{
        ChannelNotifier, Notification, Notifier, PlaceholderProfiles, ProfileLookup,
        ReadyOutcome, RoomConfig, RoomError, RoomRegistry,
    };
    pub use anteroom_timer::CancellableTimeout;
}
