//! Room lifecycle and the start-game handshake for Anteroom.
//!
//! Rooms are plain shared state behind one mutex each. The registry owns
//! them all and enforces that a player is in at most one room.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates/destroys rooms, routes players
//! - [`Room`]: membership, ownership and the `NotStarted → Starting →
//!   InProgress` state machine
//! - [`ReadyBarrier`]: collects token-checked ready confirmations for one
//!   start attempt
//! - [`Notifier`] / [`ProfileLookup`]: collaborators injected by the host
//! - [`RoomConfig`]: capacity, ready timeout, token size

mod barrier;
mod config;
mod error;
mod notify;
mod profile;
mod registry;
mod room;
mod token;

pub use barrier::{BarrierProgress, ReadyBarrier};
pub use config::RoomConfig;
pub use error::{ReadyError, RoomError};
pub use notify::{ChannelNotifier, Notification, Notifier};
pub use profile::{PlaceholderProfiles, ProfileLookup};
pub use registry::RoomRegistry;
pub use room::{ReadyOutcome, Room, RoomView};
