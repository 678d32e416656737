//! The ready barrier: one start attempt's confirmation handshake.
//!
//! When the owner starts a game, every other member receives a secret
//! token and must echo it back. The barrier records who has confirmed and
//! reports completion the moment the last expected player does.
//!
//! # Locking
//!
//! A barrier has no lock of its own. It lives inside its room's state and
//! every method is reached through the room's mutex, which makes it the
//! innermost piece of state by construction. Completion is reported as
//! [`BarrierProgress::Complete`] to the caller still holding that mutex,
//! which finalizes the room before releasing it.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anteroom_protocol::{BarrierId, PlayerId};
use anteroom_timer::CancellableTimeout;

use crate::ReadyError;

/// Result of an accepted confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierProgress {
    /// Still waiting for other players.
    Waiting { ready: usize, expected: usize },
    /// This confirmation was the last one. Reported exactly once per
    /// barrier; the timeout has already been cancelled.
    Complete,
}

/// Collects ready confirmations for a single start attempt.
#[derive(Debug)]
pub struct ReadyBarrier {
    id: BarrierId,
    /// Implicitly ready; never has to confirm.
    owner: PlayerId,
    /// Player → token they must present.
    expected: HashMap<PlayerId, String>,
    confirmed: HashSet<PlayerId>,
    timeout: Option<CancellableTimeout>,
}

impl ReadyBarrier {
    /// Creates a barrier expecting a confirmation from each player in
    /// `expected`, validated against the paired token.
    ///
    /// Callers must not build a barrier with an empty `expected` map: a
    /// lone owner has nobody to wait for and starts immediately.
    pub fn new(owner: PlayerId, expected: HashMap<PlayerId, String>) -> Self {
        debug_assert!(!expected.is_empty(), "barrier with nobody to wait for");
        Self {
            id: BarrierId::generate(),
            owner,
            expected,
            confirmed: HashSet::new(),
            timeout: None,
        }
    }

    /// Unique id of this start attempt.
    pub fn id(&self) -> BarrierId {
        self.id
    }

    /// Arms the countdown. When it elapses, `on_timeout` receives this
    /// barrier's id so the receiver can tell a stale fire from a current
    /// one.
    ///
    /// Must be called inside a Tokio runtime. Calling it again cancels the
    /// previous countdown.
    pub fn start<F>(&mut self, timeout: Duration, on_timeout: F)
    where
        F: FnOnce(BarrierId) + Send + 'static,
    {
        let id = self.id;
        if let Some(previous) = self.timeout.take() {
            previous.cancel();
        }
        self.timeout = Some(CancellableTimeout::start(timeout, move || {
            on_timeout(id)
        }));
    }

    /// Records `player` as ready if `token` is exactly the one issued to
    /// them.
    ///
    /// # Errors
    /// - [`ReadyError::AlreadyReady`]: the player confirmed before
    /// - [`ReadyError::UnknownPlayer`]: the player is not expected
    /// - [`ReadyError::InvalidToken`]: the token does not match
    pub fn ready(
        &mut self,
        player: PlayerId,
        token: &str,
    ) -> Result<BarrierProgress, ReadyError> {
        if self.confirmed.contains(&player) {
            return Err(ReadyError::AlreadyReady(player));
        }
        let expected_token = self
            .expected
            .get(&player)
            .ok_or(ReadyError::UnknownPlayer(player))?;
        if expected_token.as_str() != token {
            return Err(ReadyError::InvalidToken(player));
        }

        self.confirmed.insert(player);

        if self.confirmed.len() == self.expected.len() {
            self.cancel();
            tracing::debug!(barrier_id = %self.id, "all players confirmed");
            return Ok(BarrierProgress::Complete);
        }
        Ok(BarrierProgress::Waiting {
            ready: self.confirmed.len(),
            expected: self.expected.len(),
        })
    }

    /// Whether `player` takes part in this attempt (owner included).
    pub fn has_player(&self, player: PlayerId) -> bool {
        player == self.owner || self.expected.contains_key(&player)
    }

    /// Cancels the countdown. Confirmations already recorded stay.
    pub fn cancel(&self) {
        if let Some(timeout) = &self.timeout {
            timeout.cancel();
        }
    }

    /// Number of players that have confirmed.
    pub fn num_ready(&self) -> usize {
        self.confirmed.len()
    }

    /// Number of players that must confirm.
    pub fn num_expected(&self) -> usize {
        self.expected.len()
    }

    /// Whether the countdown is still running.
    pub fn timeout_pending(&self) -> bool {
        self.timeout.as_ref().is_some_and(CancellableTimeout::is_pending)
    }
}
