//! Core protocol types for the anteroom lobby.
//!
//! Every type here is a plain value: it can be cloned, compared and
//! serialized. The room layer hands these out as snapshots so callers never
//! hold a reference into lobby state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Issued by the authentication layer in front of the lobby; the lobby
/// never mints player ids itself. `PlayerId(0)` is an ordinary id here,
/// "no owner" is modelled with `Option<PlayerId>` instead.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as plain `42`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A globally unique, opaque identifier for a room.
///
/// Generated from a random (v4) UUID when the room is created, so ids are
/// never reused for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Generates a fresh random room id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Identifies one start attempt (one ready barrier) of a room.
///
/// A timeout carries the id of the barrier it was armed for. The room
/// compares it against its current barrier and ignores timeouts from
/// attempts that were already cancelled or superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarrierId(pub Uuid);

impl BarrierId {
    /// Generates a fresh random barrier id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BarrierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle status of a room.
///
/// ```text
/// NotStarted ──start──→ Starting ──all ready──→ InProgress
///     ↑                    │
///     └──cancel / timeout──┘
/// ```
///
/// A single-occupant room skips `Starting` and goes straight to
/// `InProgress`. Nothing leaves `InProgress`: ending a game is handled
/// outside the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RoomStatus {
    #[default]
    NotStarted,
    Starting,
    InProgress,
}

impl RoomStatus {
    /// Returns `true` while a start is underway or the game is running.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Starting | Self::InProgress)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::NotStarted, Self::Starting)
                | (Self::NotStarted, Self::InProgress)
                | (Self::Starting, Self::InProgress)
                | (Self::Starting, Self::NotStarted)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::Starting => write!(f, "Starting"),
            Self::InProgress => write!(f, "InProgress"),
        }
    }
}

// ---------------------------------------------------------------------------
// Room options and snapshots
// ---------------------------------------------------------------------------

/// Owner-supplied room options.
///
/// The lobby treats `settings` as an opaque blob. `password` is a secret:
/// it is stored with the room but must never be echoed to other players,
/// so every outward snapshot goes through [`RoomOptions::redacted`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoomOptions {
    /// Optional join password. Never serialized into snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Free-form game settings (map, mode, ...), passed through untouched.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl RoomOptions {
    /// Returns the options as they may be shown to other players.
    pub fn redacted(&self) -> PublicRoomOptions {
        PublicRoomOptions {
            has_password: self.password.is_some(),
            settings: self.settings.clone(),
        }
    }
}

/// Room options with every secret field stripped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublicRoomOptions {
    /// Whether the room is password protected.
    pub has_password: bool,
    /// The owner's free-form settings.
    pub settings: BTreeMap<String, String>,
}

/// A player together with their resolved display identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub user_id: PlayerId,
    pub nickname: String,
}

/// The outward representation of a room.
///
/// Always an independent copy: mutating it has no effect on the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: String,
    pub owner: PlayerInfo,
    pub options: PublicRoomOptions,
    /// Non-owner members, ordered by player id.
    pub players: Vec<PlayerInfo>,
    pub status: RoomStatus,
    pub max_players: usize,
}

impl RoomSnapshot {
    /// Total number of players in the room, owner included.
    pub fn occupancy(&self) -> usize {
        1 + self.players.len()
    }

    /// Returns `true` if `player` is the owner or a member.
    pub fn contains(&self, player: PlayerId) -> bool {
        self.owner.user_id == player
            || self.players.iter().any(|p| p.user_id == player)
    }
}

// ---------------------------------------------------------------------------
// LobbyEvent: asynchronous notifications
// ---------------------------------------------------------------------------

/// Events pushed to players through the notifier.
///
/// These are fire-and-forget: the lobby never waits for delivery.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON such as
/// `{ "type": "PlayerJoined", "room_id": "...", "player": 7 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyEvent {
    /// A player joined the room. Sent to the occupants already there.
    PlayerJoined { room_id: RoomId, player: PlayerId },

    /// A player left the room. `owner` is the owner after the departure,
    /// so clients learn about ownership transfers.
    PlayerLeft {
        room_id: RoomId,
        player: PlayerId,
        owner: Option<PlayerId>,
    },

    /// The owner started the game. Sent individually to each non-owner
    /// member with the token they must echo back to confirm.
    GameStarting { room_id: RoomId, token: String },

    /// A player confirmed they are ready. Sent to the other occupants.
    PlayerReady { room_id: RoomId, player: PlayerId },

    /// Every expected player confirmed; the game is in progress.
    GameStarted { room_id: RoomId },

    /// The owner cancelled the start; the room is back to `NotStarted`.
    GameStartCancelled { room_id: RoomId },
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// A decoded, authenticated request from a player.
///
/// The caller's identity is not part of the request: the transport layer
/// extracts it from the authorization header and passes it alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyRequest {
    CreateRoom {
        name: String,
        #[serde(default)]
        options: RoomOptions,
    },
    JoinRoom { room_id: RoomId },
    LeaveRoom,
    /// Lists every room except those owned by the caller.
    ListRooms,
    RoomInfo { room_id: RoomId },
    StartGame,
    CancelStart,
    PlayerReady { token: String },
}

/// The lobby's answer to a [`LobbyRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LobbyResponse {
    RoomCreated { room: RoomSnapshot },
    RoomJoined { room: RoomSnapshot },
    RoomLeft,
    RoomList { rooms: Vec<RoomSnapshot> },
    RoomInfo { room: RoomSnapshot },
    GameStarting,
    StartCancelled,
    ReadyAccepted,
    Error { code: ErrorCode, message: String },
}

/// Machine-readable error codes returned to clients.
///
/// Serialized in SCREAMING_SNAKE_CASE, e.g. `"ROOM_FULL"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AlreadyInRoom,
    RoomDoesNotExist,
    RoomFull,
    NotInRoom,
    NotOwner,
    AlreadyStarted,
    NotStarting,
    UnexpectedReady,
    GameStartInProgress,
    InvalidToken,
    UnknownPlayer,
    AlreadyReady,
}

// =========================================================================
// Tests
// =========================================================================
