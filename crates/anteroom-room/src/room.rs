//! A room's membership and its start-game state machine.
//!
//! [`Room`] is a cheap, clonable handle. All state sits behind one mutex
//! per room, so every operation on a room is serialized. The ready barrier
//! of the current start attempt lives inside that state: it is only ever
//! touched with the room lock held.
//!
//! The ready timeout runs as a Tokio task holding a weak reference to the
//! room. When it fires it takes the room lock and resets the room only if
//! the barrier it was armed for is still the current one.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use anteroom_protocol::{
    BarrierId, PlayerId, RoomId, RoomOptions, RoomSnapshot, RoomStatus,
};

use crate::barrier::{BarrierProgress, ReadyBarrier};
use crate::token::generate_token;
use crate::{ProfileLookup, RoomConfig, RoomError};

/// What an accepted ready confirmation did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Recorded; other players still have to confirm.
    Waiting,
    /// This confirmation completed the handshake. The room is now
    /// `InProgress`. Returned to exactly one caller per start attempt.
    GameStarted,
}

/// A point-in-time copy of a room's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    pub id: RoomId,
    pub name: String,
    pub options: RoomOptions,
    /// `None` once the last occupant has left.
    pub owner: Option<PlayerId>,
    /// Non-owner members, ordered by id.
    pub members: Vec<PlayerId>,
    pub status: RoomStatus,
    pub max_players: usize,
}

impl RoomView {
    /// Resolves display identities and strips secret options.
    ///
    /// Returns `None` for a room nobody occupies any more.
    pub fn to_snapshot(&self, profiles: &impl ProfileLookup) -> Option<RoomSnapshot> {
        let owner = self.owner?;
        Some(RoomSnapshot {
            id: self.id,
            name: self.name.clone(),
            owner: profiles.player_info(owner),
            options: self.options.redacted(),
            players: self.members.iter().map(|p| profiles.player_info(*p)).collect(),
            status: self.status,
            max_players: self.max_players,
        })
    }
}

struct RoomShared {
    id: RoomId,
    name: String,
    options: RoomOptions,
    max_players: usize,
    token_bytes: usize,
    inner: Mutex<RoomInner>,
}

struct RoomInner {
    owner: Option<PlayerId>,
    /// Non-owner member → their current secret ready token.
    members: BTreeMap<PlayerId, String>,
    status: RoomStatus,
    /// The current start attempt, while one is collecting confirmations.
    barrier: Option<ReadyBarrier>,
    ready_timeout: Duration,
}

impl RoomInner {
    fn occupancy(&self) -> usize {
        usize::from(self.owner.is_some()) + self.members.len()
    }
}

/// Handle to a room. Clones share the same room.
#[derive(Clone)]
pub struct Room {
    shared: Arc<RoomShared>,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .finish_non_exhaustive()
    }
}

impl Room {
    /// Creates a room owned by `owner` with a freshly generated id.
    pub fn new(
        name: impl Into<String>,
        owner: PlayerId,
        options: RoomOptions,
        config: &RoomConfig,
    ) -> Self {
        Self {
            shared: Arc::new(RoomShared {
                id: RoomId::generate(),
                name: name.into(),
                options,
                max_players: config.max_players,
                token_bytes: config.token_bytes,
                inner: Mutex::new(RoomInner {
                    owner: Some(owner),
                    members: BTreeMap::new(),
                    status: RoomStatus::NotStarted,
                    barrier: None,
                    ready_timeout: config.ready_timeout,
                }),
            }),
        }
    }

    pub fn id(&self) -> RoomId {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Changes the timeout used by subsequent start attempts.
    pub fn set_ready_timeout(&self, timeout: Duration) {
        self.lock().ready_timeout = timeout;
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Adds `player` with a new secret token.
    ///
    /// Joining is allowed in every status. A player joining while a start
    /// is underway is not part of that attempt's handshake.
    /// Re-joining is a no-op.
    ///
    /// # Errors
    /// [`RoomError::RoomFull`] if occupancy already equals the maximum.
    pub fn join(&self, player: PlayerId) -> Result<(), RoomError> {
        let mut inner = self.lock();
        if inner.owner == Some(player) || inner.members.contains_key(&player) {
            return Ok(());
        }
        if inner.occupancy() >= self.shared.max_players {
            return Err(RoomError::RoomFull(self.shared.id));
        }

        if inner.owner.is_none() {
            inner.owner = Some(player);
        } else {
            let token = generate_token(self.shared.token_bytes);
            inner.members.insert(player, token);
        }
        tracing::info!(
            room_id = %self.shared.id,
            player_id = %player,
            players = inner.occupancy(),
            "player joined"
        );
        Ok(())
    }

    /// Removes `player`. Returns `false` if the room is now empty.
    ///
    /// If the owner leaves while others remain, the member with the lowest
    /// id becomes the owner.
    ///
    /// # Errors
    /// - [`RoomError::GameStartInProgress`]: the player is part of the
    ///   running ready handshake
    /// - [`RoomError::NotInRoom`]: the player is not in this room
    pub fn leave(&self, player: PlayerId) -> Result<bool, RoomError> {
        let mut inner = self.lock();
        if inner.barrier.as_ref().is_some_and(|b| b.has_player(player)) {
            return Err(RoomError::GameStartInProgress(self.shared.id));
        }

        if inner.owner == Some(player) {
            match inner.members.pop_first() {
                Some((next_owner, _)) => {
                    inner.owner = Some(next_owner);
                    tracing::info!(
                        room_id = %self.shared.id,
                        player_id = %player,
                        new_owner = %next_owner,
                        "owner left, ownership transferred"
                    );
                    Ok(true)
                }
                None => {
                    inner.owner = None;
                    tracing::info!(
                        room_id = %self.shared.id,
                        player_id = %player,
                        "last player left"
                    );
                    Ok(false)
                }
            }
        } else if inner.members.remove(&player).is_some() {
            tracing::info!(
                room_id = %self.shared.id,
                player_id = %player,
                players = inner.occupancy(),
                "player left"
            );
            Ok(true)
        } else {
            Err(RoomError::NotInRoom(player))
        }
    }

    // -----------------------------------------------------------------
    // Start-game state machine
    // -----------------------------------------------------------------

    /// Begins the ready handshake and returns each member's token.
    ///
    /// The tokens must be delivered to their players, who confirm with
    /// [`player_ready`](Self::player_ready). A room with only its owner
    /// starts immediately and returns an empty map.
    ///
    /// Arms the ready timeout, so this must run inside a Tokio runtime
    /// when the room has members.
    ///
    /// # Errors
    /// [`RoomError::AlreadyStarted`] unless the room is `NotStarted`.
    pub fn start_game(&self) -> Result<HashMap<PlayerId, String>, RoomError> {
        let mut inner = self.lock();
        if inner.status.is_started() {
            return Err(RoomError::AlreadyStarted(self.shared.id));
        }
        let owner = inner
            .owner
            .ok_or(RoomError::RoomDoesNotExist(self.shared.id))?;

        if inner.members.is_empty() {
            self.finalize(&mut inner);
            return Ok(HashMap::new());
        }

        let tokens: HashMap<PlayerId, String> = inner
            .members
            .iter()
            .map(|(player, token)| (*player, token.clone()))
            .collect();

        let mut barrier = ReadyBarrier::new(owner, tokens.clone());
        let room = Arc::downgrade(&self.shared);
        barrier.start(inner.ready_timeout, move |barrier_id| {
            on_ready_timeout(&room, barrier_id);
        });
        tracing::info!(
            room_id = %self.shared.id,
            barrier_id = %barrier.id(),
            expected = tokens.len(),
            timeout = ?inner.ready_timeout,
            "game start requested, waiting for players"
        );
        inner.barrier = Some(barrier);
        transition(&mut inner, RoomStatus::Starting);
        Ok(tokens)
    }

    /// Abandons the running start attempt.
    ///
    /// # Errors
    /// [`RoomError::NotStarting`] unless the room is `Starting`.
    pub fn cancel_start(&self) -> Result<(), RoomError> {
        let mut inner = self.lock();
        if inner.status != RoomStatus::Starting {
            return Err(RoomError::NotStarting(self.shared.id));
        }
        tracing::info!(room_id = %self.shared.id, "game start cancelled");
        self.reset(&mut inner);
        Ok(())
    }

    /// Confirms that `player` is ready, using the token issued by
    /// [`start_game`](Self::start_game).
    ///
    /// # Errors
    /// - [`RoomError::UnexpectedReady`]: the room is not `Starting`
    /// - [`RoomError::Ready`]: the barrier rejected the confirmation
    pub fn player_ready(
        &self,
        player: PlayerId,
        token: &str,
    ) -> Result<ReadyOutcome, RoomError> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.status != RoomStatus::Starting {
            return Err(RoomError::UnexpectedReady(self.shared.id));
        }
        let Some(barrier) = inner.barrier.as_mut() else {
            return Err(RoomError::UnexpectedReady(self.shared.id));
        };

        match barrier.ready(player, token)? {
            BarrierProgress::Waiting { ready, expected } => {
                tracing::debug!(
                    room_id = %self.shared.id,
                    player_id = %player,
                    ready,
                    expected,
                    "player ready"
                );
                Ok(ReadyOutcome::Waiting)
            }
            BarrierProgress::Complete => {
                inner.barrier = None;
                self.finalize(inner);
                Ok(ReadyOutcome::GameStarted)
            }
        }
    }

    /// Moves the room to `InProgress`. Caller holds the room lock.
    fn finalize(&self, inner: &mut RoomInner) {
        transition(inner, RoomStatus::InProgress);
        tracing::info!(
            room_id = %self.shared.id,
            players = inner.occupancy(),
            "all players ready, game in progress"
        );
    }

    /// Drops the start attempt and issues every member a new token, so
    /// confirmations computed against the old tokens are rejected.
    /// Caller holds the room lock.
    fn reset(&self, inner: &mut RoomInner) {
        if let Some(barrier) = inner.barrier.take() {
            barrier.cancel();
        }
        for token in inner.members.values_mut() {
            *token = generate_token(self.shared.token_bytes);
        }
        transition(inner, RoomStatus::NotStarted);
    }

    // -----------------------------------------------------------------
    // Read accessors (each returns an independent copy)
    // -----------------------------------------------------------------

    /// Number of players in the room, owner included.
    pub fn occupancy(&self) -> usize {
        self.lock().occupancy()
    }

    /// Every occupant: the owner first, then members by id.
    pub fn member_ids(&self) -> Vec<PlayerId> {
        let inner = self.lock();
        inner
            .owner
            .into_iter()
            .chain(inner.members.keys().copied())
            .collect()
    }

    /// Every occupant except the owner, ordered by id.
    pub fn non_owner_member_ids(&self) -> Vec<PlayerId> {
        self.lock().members.keys().copied().collect()
    }

    pub fn owner_id(&self) -> Option<PlayerId> {
        self.lock().owner
    }

    pub fn status(&self) -> RoomStatus {
        self.lock().status
    }

    /// Copies the whole room state under a single lock acquisition.
    pub fn view(&self) -> RoomView {
        let inner = self.lock();
        RoomView {
            id: self.shared.id,
            name: self.shared.name.clone(),
            options: self.shared.options.clone(),
            owner: inner.owner,
            members: inner.members.keys().copied().collect(),
            status: inner.status,
            max_players: self.shared.max_players,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RoomInner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn transition(inner: &mut RoomInner, next: RoomStatus) {
    debug_assert!(
        inner.status.can_transition_to(next),
        "illegal room transition {} -> {}",
        inner.status,
        next
    );
    inner.status = next;
}

/// Timeout handler. Resets the room only if `barrier_id` still names the
/// current attempt; a timeout from a cancelled or completed attempt that
/// lost the race against the room lock does nothing.
fn on_ready_timeout(room: &Weak<RoomShared>, barrier_id: BarrierId) {
    let Some(shared) = room.upgrade() else {
        return;
    };
    let room = Room { shared };
    let mut inner = room.lock();
    let current = inner.barrier.as_ref().map(ReadyBarrier::id);
    if current == Some(barrier_id) {
        tracing::info!(
            room_id = %room.shared.id,
            %barrier_id,
            "ready timeout elapsed, resetting room"
        );
        room.reset(&mut inner);
    } else {
        tracing::trace!(
            room_id = %room.shared.id,
            %barrier_id,
            "stale ready timeout ignored"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anteroom_protocol::ErrorCode;

    use super::*;
    use crate::ReadyError;

    const OWNER: PlayerId = PlayerId(1);

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn config(max_players: usize, ready_timeout: Duration) -> RoomConfig {
        RoomConfig {
            max_players,
            ready_timeout,
            ..RoomConfig::default()
        }
    }

    /// Owner 1, capacity 3, long timeout.
    fn room() -> Room {
        room_with_timeout(Duration::from_secs(15))
    }

    fn room_with_timeout(timeout: Duration) -> Room {
        Room::new("name", OWNER, RoomOptions::default(), &config(3, timeout))
    }

    // =====================================================================
    // creation
    // =====================================================================

    #[test]
    fn test_new_room_ids_are_unique() {
        assert_ne!(room().id(), room().id());
    }

    #[test]
    fn test_new_room_has_only_owner() {
        let r = room();
        assert_eq!(r.occupancy(), 1);
        assert_eq!(r.member_ids(), vec![OWNER]);
        assert_eq!(r.owner_id(), Some(OWNER));
        assert_eq!(r.status(), RoomStatus::NotStarted);
    }

    // =====================================================================
    // join()
    // =====================================================================

    #[test]
    fn test_join_adds_player() {
        let r = room();
        r.join(pid(2)).unwrap();
        assert_eq!(r.occupancy(), 2);
        assert!(r.member_ids().contains(&pid(2)));
    }

    #[test]
    fn test_join_full_room_returns_room_full() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.join(pid(3)).unwrap();

        let result = r.join(pid(4));

        assert_eq!(result, Err(RoomError::RoomFull(r.id())));
        assert_eq!(r.occupancy(), 3);
    }

    #[test]
    fn test_join_twice_is_idempotent() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.join(pid(2)).unwrap();
        r.join(OWNER).unwrap();
        assert_eq!(r.occupancy(), 2);
    }

    // =====================================================================
    // leave()
    // =====================================================================

    #[test]
    fn test_leave_removes_members() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.join(pid(3)).unwrap();

        assert_eq!(r.leave(pid(2)), Ok(true));
        assert_eq!(r.occupancy(), 2);
        assert_eq!(r.leave(pid(3)), Ok(true));
        assert_eq!(r.occupancy(), 1);
    }

    #[test]
    fn test_leave_owner_transfers_ownership() {
        let r = room();
        r.join(pid(2)).unwrap();

        assert_eq!(r.leave(OWNER), Ok(true));

        assert_eq!(r.occupancy(), 1);
        assert!(!r.member_ids().contains(&OWNER));
        assert_eq!(r.owner_id(), Some(pid(2)));
        assert!(r.non_owner_member_ids().is_empty());
    }

    #[test]
    fn test_leave_last_player_empties_room() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.join(pid(3)).unwrap();

        assert_eq!(r.leave(OWNER), Ok(true));
        let next = r.owner_id().unwrap();
        let other = if next == pid(2) { pid(3) } else { pid(2) };
        assert_eq!(r.leave(other), Ok(true));

        assert_eq!(r.leave(next), Ok(false), "no players left");
        assert_eq!(r.owner_id(), None);
        assert_eq!(r.occupancy(), 0);
    }

    #[test]
    fn test_leave_stranger_returns_not_in_room() {
        let r = room();
        assert_eq!(r.leave(pid(9)), Err(RoomError::NotInRoom(pid(9))));
    }

    #[test]
    fn test_non_owner_member_ids_excludes_owner() {
        let r = room();
        r.join(pid(2)).unwrap();
        assert_eq!(r.non_owner_member_ids(), vec![pid(2)]);

        r.leave(pid(2)).unwrap();
        assert!(r.non_owner_member_ids().is_empty());
    }

    // =====================================================================
    // start_game() / cancel_start()
    // =====================================================================

    #[test]
    fn test_start_game_alone_is_immediately_in_progress() {
        let r = room();

        let tokens = r.start_game().unwrap();

        assert!(tokens.is_empty());
        assert_eq!(r.status(), RoomStatus::InProgress);
    }

    #[tokio::test]
    async fn test_start_game_returns_token_per_member() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.join(pid(3)).unwrap();

        let tokens = r.start_game().unwrap();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[&pid(2)].len(), RoomConfig::DEFAULT_TOKEN_BYTES * 2);
        assert!(!tokens.contains_key(&OWNER));
        assert_eq!(r.status(), RoomStatus::Starting);
        r.cancel_start().unwrap();
    }

    #[tokio::test]
    async fn test_start_game_twice_returns_already_started() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.start_game().unwrap();

        assert_eq!(r.start_game(), Err(RoomError::AlreadyStarted(r.id())));
        r.cancel_start().unwrap();
    }

    #[test]
    fn test_start_game_in_progress_returns_already_started() {
        let r = room();
        r.start_game().unwrap();
        assert_eq!(r.start_game(), Err(RoomError::AlreadyStarted(r.id())));
    }

    #[tokio::test]
    async fn test_cancel_start_resets_status() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.start_game().unwrap();

        r.cancel_start().unwrap();

        assert_eq!(r.status(), RoomStatus::NotStarted);
    }

    #[test]
    fn test_cancel_start_when_not_starting_returns_not_starting() {
        let r = room();
        assert_eq!(r.cancel_start(), Err(RoomError::NotStarting(r.id())));
    }

    #[tokio::test]
    async fn test_cancel_start_invalidates_old_tokens() {
        let r = room();
        r.join(pid(2)).unwrap();
        let first = r.start_game().unwrap();
        r.cancel_start().unwrap();

        r.start_game().unwrap();
        let result = r.player_ready(pid(2), &first[&pid(2)]);

        assert_eq!(result, Err(RoomError::Ready(ReadyError::InvalidToken(pid(2)))));
        r.cancel_start().unwrap();
    }

    // =====================================================================
    // leave() during a start attempt
    // =====================================================================

    #[tokio::test]
    async fn test_leave_expected_player_during_start_is_refused() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.start_game().unwrap();

        assert_eq!(r.leave(pid(2)), Err(RoomError::GameStartInProgress(r.id())));
        assert_eq!(r.leave(OWNER), Err(RoomError::GameStartInProgress(r.id())));
        assert_eq!(r.occupancy(), 2);
        r.cancel_start().unwrap();
    }

    #[tokio::test]
    async fn test_late_joiner_can_leave_during_start() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.start_game().unwrap();

        r.join(pid(3)).unwrap();

        assert_eq!(r.leave(pid(3)), Ok(true));
        r.cancel_start().unwrap();
    }

    #[tokio::test]
    async fn test_players_can_leave_after_game_started() {
        let r = room();
        r.join(pid(2)).unwrap();
        let tokens = r.start_game().unwrap();
        r.player_ready(pid(2), &tokens[&pid(2)]).unwrap();

        assert_eq!(r.leave(pid(2)), Ok(true));
    }

    // =====================================================================
    // player_ready()
    // =====================================================================

    #[test]
    fn test_player_ready_when_not_starting_returns_unexpected_ready() {
        let r = room();
        r.join(pid(2)).unwrap();
        assert_eq!(
            r.player_ready(pid(2), "state"),
            Err(RoomError::UnexpectedReady(r.id()))
        );
    }

    #[tokio::test]
    async fn test_game_starts_when_all_players_ready() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.join(pid(3)).unwrap();
        assert_eq!(r.occupancy(), 3);

        let tokens = r.start_game().unwrap();
        assert_eq!(r.status(), RoomStatus::Starting);

        let first = r.player_ready(pid(2), &tokens[&pid(2)]).unwrap();
        assert_eq!(first, ReadyOutcome::Waiting);
        assert_eq!(r.status(), RoomStatus::Starting);

        let second = r.player_ready(pid(3), &tokens[&pid(3)]).unwrap();
        assert_eq!(second, ReadyOutcome::GameStarted);
        assert_eq!(r.status(), RoomStatus::InProgress);
    }

    #[tokio::test]
    async fn test_player_ready_rejections_pass_through() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.join(pid(3)).unwrap();
        let tokens = r.start_game().unwrap();

        let code = |result: Result<ReadyOutcome, RoomError>| result.unwrap_err().code();

        assert_eq!(code(r.player_ready(pid(2), "wrong")), ErrorCode::InvalidToken);
        r.player_ready(pid(2), &tokens[&pid(2)]).unwrap();
        assert_eq!(
            code(r.player_ready(pid(2), &tokens[&pid(2)])),
            ErrorCode::AlreadyReady
        );
        assert_eq!(code(r.player_ready(pid(7), "x")), ErrorCode::UnknownPlayer);
        assert_eq!(r.status(), RoomStatus::Starting);
        r.cancel_start().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_confirmations_finalize_exactly_once() {
        let r = Room::new(
            "crowd",
            OWNER,
            RoomOptions::default(),
            &config(16, Duration::from_secs(15)),
        );
        for id in 2..=16 {
            r.join(pid(id)).unwrap();
        }
        let tokens = r.start_game().unwrap();
        let started = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for (player, token) in &tokens {
                let (r, started) = (&r, &started);
                s.spawn(move || {
                    if r.player_ready(*player, token) == Ok(ReadyOutcome::GameStarted) {
                        started.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(r.status(), RoomStatus::InProgress);
    }

    // =====================================================================
    // ready timeout
    // =====================================================================

    #[tokio::test(start_paused = true)]
    async fn test_timeout_resets_room_status() {
        let r = room_with_timeout(Duration::from_millis(100));
        r.join(pid(2)).unwrap();
        r.start_game().unwrap();
        assert_eq!(r.status(), RoomStatus::Starting);

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(r.status(), RoomStatus::NotStarted);
        assert_eq!(r.leave(pid(2)), Ok(true), "handshake is over");
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_ready_timeout_applies_to_next_start() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.set_ready_timeout(Duration::from_millis(10));

        r.start_game().unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(r.status(), RoomStatus::NotStarted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_regenerates_tokens() {
        let r = room_with_timeout(Duration::from_millis(100));
        r.join(pid(2)).unwrap();
        r.join(pid(3)).unwrap();
        let first = r.start_game().unwrap();
        r.player_ready(pid(2), &first[&pid(2)]).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(r.status(), RoomStatus::NotStarted);
        let second = r.start_game().unwrap();

        assert_ne!(first[&pid(2)], second[&pid(2)], "token should be regenerated");
        assert!(r.player_ready(pid(2), &first[&pid(2)]).is_err());
        r.cancel_start().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timeout_does_not_reset_new_attempt() {
        let r = room_with_timeout(Duration::from_millis(100));
        r.join(pid(2)).unwrap();
        r.start_game().unwrap();
        r.cancel_start().unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        r.start_game().unwrap();
        // The first attempt's deadline (t=100ms) passes; the second's
        // (t=150ms) has not.
        tokio::time::sleep(Duration::from_millis(75)).await;

        assert_eq!(r.status(), RoomStatus::Starting);
        r.cancel_start().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timeout_ignored_for_direct_call() {
        let r = room();
        r.join(pid(2)).unwrap();
        r.start_game().unwrap();

        on_ready_timeout(&Arc::downgrade(&r.shared), BarrierId::generate());

        assert_eq!(r.status(), RoomStatus::Starting);
        r.cancel_start().unwrap();
    }

    // =====================================================================
    // view()
    // =====================================================================

    #[test]
    fn test_view_is_an_independent_copy() {
        let r = room();
        r.join(pid(2)).unwrap();
        let mut view = r.view();

        view.members.push(pid(99));
        view.owner = None;

        assert_eq!(r.occupancy(), 2);
        assert_eq!(r.owner_id(), Some(OWNER));
        assert_eq!(view.max_players, 3);
    }
}
