//! Shared vocabulary of the anteroom lobby.
//!
//! This crate defines the values that cross the lobby boundary:
//!
//! - **Identities** ([`PlayerId`], [`RoomId`], [`BarrierId`])
//! - **Room views** ([`RoomSnapshot`], [`PlayerInfo`], [`RoomOptions`],
//!   [`RoomStatus`])
//! - **Notifications** ([`LobbyEvent`]) pushed to players asynchronously
//! - **Commands** ([`LobbyRequest`], [`LobbyResponse`], [`ErrorCode`])
//!   exchanged with the request-handling layer
//!
//! It does not encode anything to bytes. The transport in front of the
//! lobby picks a wire format; every type here derives serde so any format
//! works.

mod types;

pub use types::{
    BarrierId, ErrorCode, LobbyEvent, LobbyRequest, LobbyResponse, PlayerId,
    PlayerInfo, PublicRoomOptions, RoomId, RoomOptions, RoomSnapshot,
    RoomStatus,
};
