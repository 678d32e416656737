//! Room registry: the room table and the player-to-room index.
//!
//! # Locking
//!
//! Two registry locks guard the indexes: `players` (player → room) and
//! `rooms` (room id → [`Room`]). Every room has its own lock on top. They
//! are always taken in this order:
//!
//! ```text
//! players  →  rooms  →  one room
//! ```
//!
//! Any operation that changes a player's membership holds `players` for its
//! whole duration, which makes create, join (with its implicit leave) and
//! leave atomic per player: the index and the room's member list never
//! disagree once the lock is released. Notifications go out after every
//! lock has been dropped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anteroom_protocol::{LobbyEvent, PlayerId, RoomId, RoomOptions, RoomSnapshot};

use crate::{Notifier, ProfileLookup, ReadyOutcome, Room, RoomConfig, RoomError, RoomView};

type PlayerIndex = HashMap<PlayerId, RoomId>;

/// What a successful leave left behind, for notifying the others.
struct Departure {
    room_id: RoomId,
    player: PlayerId,
    remaining: Vec<PlayerId>,
    owner: Option<PlayerId>,
}

/// Manages all active rooms and tracks which player is in which room.
///
/// This is the entry point for request handlers. Share it behind an `Arc`;
/// every method takes `&self`.
pub struct RoomRegistry<N: Notifier, P: ProfileLookup> {
    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time.
    players: Mutex<PlayerIndex>,

    /// Active rooms, keyed by room ID.
    rooms: RwLock<HashMap<RoomId, Room>>,

    config: RoomConfig,
    notifier: N,
    profiles: P,
}

impl<N: Notifier, P: ProfileLookup> RoomRegistry<N, P> {
    /// Creates an empty registry. Every room it creates uses `config`.
    pub fn new(config: RoomConfig, notifier: N, profiles: P) -> Self {
        Self {
            players: Mutex::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
            config,
            notifier,
            profiles,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Creates a room owned by `player` and returns its snapshot.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`] if the player is in a room already.
    pub fn create_room(
        &self,
        player: PlayerId,
        name: impl Into<String>,
        options: RoomOptions,
    ) -> Result<RoomSnapshot, RoomError> {
        let mut players = self.lock_players();
        if let Some(current) = players.get(&player) {
            return Err(RoomError::AlreadyInRoom(player, *current));
        }

        let room = Room::new(name, player, options, &self.config);
        let room_id = room.id();
        self.write_rooms().insert(room_id, room.clone());
        players.insert(player, room_id);
        let view = room.view();
        drop(players);

        tracing::info!(%room_id, player_id = %player, name = room.name(), "room created");
        self.present(view).ok_or(RoomError::RoomDoesNotExist(room_id))
    }

    /// Moves `player` into `room_id` and returns the room's snapshot.
    ///
    /// A player already in another room leaves it as part of the same
    /// operation. If that departure is refused the player stays where they
    /// were. Joining the room the player is already in changes nothing.
    ///
    /// # Errors
    /// - [`RoomError::RoomDoesNotExist`]: unknown room id
    /// - [`RoomError::RoomFull`]: the target room has no free slot
    /// - [`RoomError::GameStartInProgress`]: the player is bound to a
    ///   ready handshake in their current room
    pub fn join_room(&self, player: PlayerId, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        let mut players = self.lock_players();
        let target = self
            .read_rooms()
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::RoomDoesNotExist(room_id))?;

        let previous = players.get(&player).copied();
        if previous == Some(room_id) {
            let view = target.view();
            drop(players);
            return self.present(view).ok_or(RoomError::RoomDoesNotExist(room_id));
        }

        let prior_occupants = target.member_ids();
        target.join(player)?;

        let departure = match previous {
            Some(_) => match self.leave_locked(&mut players, player) {
                Ok(departure) => Some(departure),
                Err(err) => {
                    // Roll back: a fresh non-owner member can always leave.
                    let _ = target.leave(player);
                    tracing::debug!(
                        %room_id,
                        player_id = %player,
                        error = %err,
                        "join refused, could not leave previous room"
                    );
                    return Err(err);
                }
            },
            None => None,
        };
        players.insert(player, room_id);
        let view = target.view();
        drop(players);

        if let Some(departure) = departure {
            self.announce_departure(departure);
        }
        self.notifier
            .notify(&prior_occupants, LobbyEvent::PlayerJoined { room_id, player });
        self.present(view).ok_or(RoomError::RoomDoesNotExist(room_id))
    }

    /// Removes `player` from their room. An emptied room is destroyed.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`]: the player is not in a room
    /// - [`RoomError::GameStartInProgress`]: the player is bound to the
    ///   running ready handshake; they stay in the room
    pub fn leave_room(&self, player: PlayerId) -> Result<(), RoomError> {
        let departure = {
            let mut players = self.lock_players();
            self.leave_locked(&mut players, player)?
        };
        self.announce_departure(departure);
        Ok(())
    }

    /// Leave while the caller holds the player index.
    fn leave_locked(
        &self,
        players: &mut PlayerIndex,
        player: PlayerId,
    ) -> Result<Departure, RoomError> {
        let room_id = players
            .get(&player)
            .copied()
            .ok_or(RoomError::NotInRoom(player))?;
        let room = self.read_rooms().get(&room_id).cloned();
        let Some(room) = room else {
            // Index entry for a room that no longer exists.
            players.remove(&player);
            return Err(RoomError::NotInRoom(player));
        };

        let still_occupied = room.leave(player)?;
        players.remove(&player);
        if !still_occupied {
            self.write_rooms().remove(&room_id);
            tracing::info!(%room_id, "room destroyed");
        }

        Ok(Departure {
            room_id,
            player,
            remaining: room.member_ids(),
            owner: room.owner_id(),
        })
    }

    fn announce_departure(&self, departure: Departure) {
        let Departure {
            room_id,
            player,
            remaining,
            owner,
        } = departure;
        self.notifier.notify(
            &remaining,
            LobbyEvent::PlayerLeft {
                room_id,
                player,
                owner,
            },
        );
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Lists every room except the ones `player` owns.
    ///
    /// Rooms are ordered by name, then id.
    pub fn list_rooms_excluding(&self, player: PlayerId) -> Vec<RoomSnapshot> {
        let rooms: Vec<Room> = self.read_rooms().values().cloned().collect();
        let mut snapshots: Vec<RoomSnapshot> = rooms
            .iter()
            .map(Room::view)
            .filter(|view| view.owner != Some(player))
            .filter_map(|view| self.present(view))
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.0.cmp(&b.id.0)));
        snapshots
    }

    /// Returns the snapshot of a specific room.
    ///
    /// # Errors
    /// [`RoomError::RoomDoesNotExist`] for an unknown room id.
    pub fn get_room(&self, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        let room = self
            .read_rooms()
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::RoomDoesNotExist(room_id))?;
        self.present(room.view())
            .ok_or(RoomError::RoomDoesNotExist(room_id))
    }

    /// Returns the room ID a player is currently in, if any.
    pub fn player_room(&self, player: PlayerId) -> Option<RoomId> {
        self.lock_players().get(&player).copied()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.read_rooms().len()
    }

    // -----------------------------------------------------------------
    // Start-game handshake
    // -----------------------------------------------------------------

    /// Starts the game in the owner's room and sends each member their
    /// ready token.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`]: the player is not in a room
    /// - [`RoomError::NotOwner`]: the player does not own their room
    /// - [`RoomError::AlreadyStarted`]: the room is not `NotStarted`
    pub fn start_game(&self, player: PlayerId) -> Result<(), RoomError> {
        let (room, tokens) = {
            let players = self.lock_players();
            let room = self.owned_room(&players, player)?;
            let tokens = room.start_game()?;
            (room, tokens)
        };
        let room_id = room.id();

        if tokens.is_empty() {
            self.notifier
                .notify(&room.member_ids(), LobbyEvent::GameStarted { room_id });
            return Ok(());
        }
        for (member, token) in tokens {
            self.notifier
                .notify(&[member], LobbyEvent::GameStarting { room_id, token });
        }
        Ok(())
    }

    /// Abandons the running start attempt in the owner's room.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`]: the player is not in a room
    /// - [`RoomError::NotOwner`]: the player does not own their room
    /// - [`RoomError::NotStarting`]: no start attempt is running
    pub fn cancel_start(&self, player: PlayerId) -> Result<(), RoomError> {
        let room = {
            let players = self.lock_players();
            let room = self.owned_room(&players, player)?;
            room.cancel_start()?;
            room
        };
        self.notifier.notify(
            &room.non_owner_member_ids(),
            LobbyEvent::GameStartCancelled { room_id: room.id() },
        );
        Ok(())
    }

    /// Records `player`'s ready confirmation.
    ///
    /// The other occupants hear about it. If it was the last confirmation
    /// everyone also receives `GameStarted`.
    ///
    /// # Errors
    /// - [`RoomError::NotInRoom`]: the player is not in a room
    /// - [`RoomError::UnexpectedReady`]: the room is not starting
    /// - [`RoomError::Ready`]: unknown player, wrong token, or a repeat
    pub fn player_ready(&self, player: PlayerId, token: &str) -> Result<ReadyOutcome, RoomError> {
        let room = {
            let players = self.lock_players();
            self.room_of(&players, player)?
        };
        let room_id = room.id();

        let outcome = room.player_ready(player, token).inspect_err(|err| {
            tracing::debug!(%room_id, player_id = %player, error = %err, "ready rejected");
        })?;

        let occupants = room.member_ids();
        let others: Vec<PlayerId> = occupants.iter().copied().filter(|p| *p != player).collect();
        self.notifier
            .notify(&others, LobbyEvent::PlayerReady { room_id, player });
        if outcome == ReadyOutcome::GameStarted {
            self.notifier
                .notify(&occupants, LobbyEvent::GameStarted { room_id });
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// The room `player` is registered to. Caller holds the player index.
    fn room_of(&self, players: &PlayerIndex, player: PlayerId) -> Result<Room, RoomError> {
        let room_id = players.get(&player).ok_or(RoomError::NotInRoom(player))?;
        self.read_rooms()
            .get(room_id)
            .cloned()
            .ok_or(RoomError::NotInRoom(player))
    }

    /// Like [`room_of`](Self::room_of), but only for the room's owner.
    fn owned_room(&self, players: &PlayerIndex, player: PlayerId) -> Result<Room, RoomError> {
        let room = self.room_of(players, player)?;
        if room.owner_id() != Some(player) {
            return Err(RoomError::NotOwner(player, room.id()));
        }
        Ok(room)
    }

    /// Resolves a view into its outward representation. Runs outside
    /// every lock since it calls the profile lookup.
    fn present(&self, view: RoomView) -> Option<RoomSnapshot> {
        view.to_snapshot(&self.profiles)
    }

    fn lock_players(&self) -> MutexGuard<'_, PlayerIndex> {
        self.players.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_rooms(&self) -> RwLockReadGuard<'_, HashMap<RoomId, Room>> {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_rooms(&self) -> RwLockWriteGuard<'_, HashMap<RoomId, Room>> {
        self.rooms.write().unwrap_or_else(PoisonError::into_inner)
    }
}
