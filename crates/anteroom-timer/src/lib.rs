//! One-shot cancellable timeouts for the anteroom lobby.
//!
//! A [`CancellableTimeout`] runs an action once after a delay unless it is
//! cancelled first. Firing and cancelling race through a single-fire latch:
//! whichever side flips it from pending first wins, and the loser becomes a
//! no-op. Cancelling is idempotent and never blocks.
//!
//! # Runtime
//!
//! The waiter is a Tokio task, so [`CancellableTimeout::start`] must be
//! called from inside a Tokio runtime. Timers follow Tokio's clock: tests
//! can pause and advance it (`#[tokio::test(start_paused = true)]`) to make
//! timeouts deterministic.
//!
//! ```ignore
//! let timeout = CancellableTimeout::start(Duration::from_secs(15), move || {
//!     reset_room_if_still_starting(room_id);
//! });
//! // ... all players confirmed in time:
//! timeout.cancel();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::trace;

// ---------------------------------------------------------------------------
// Latch
// ---------------------------------------------------------------------------

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// How a timeout was resolved, or that it has not been yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutState {
    /// Neither fired nor cancelled.
    Pending,
    /// The deadline elapsed first; the action ran (or is running).
    Fired,
    /// A cancellation won the race; the action will never run.
    Cancelled,
}

/// State shared between the handle and the background waiter.
#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    cancelled: Notify,
}

impl Shared {
    /// Moves the latch out of `PENDING`. Only the first caller succeeds.
    fn resolve(&self, outcome: u8) -> bool {
        self.state
            .compare_exchange(PENDING, outcome, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn load(&self) -> TimeoutState {
        match self.state.load(Ordering::Acquire) {
            PENDING => TimeoutState::Pending,
            FIRED => TimeoutState::Fired,
            _ => TimeoutState::Cancelled,
        }
    }
}

// ---------------------------------------------------------------------------
// CancellableTimeout
// ---------------------------------------------------------------------------

/// Handle to a deferred action that can be cancelled before it fires.
///
/// Dropping the handle does not cancel the timeout.
#[derive(Debug, Clone)]
pub struct CancellableTimeout {
    shared: Arc<Shared>,
    duration: Duration,
}

impl CancellableTimeout {
    /// Starts waiting `duration` in the background, then runs `action`
    /// unless [`cancel`](Self::cancel) wins the race first.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start<F>(duration: Duration, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: AtomicU8::new(PENDING),
            cancelled: Notify::new(),
        });

        let waiter = Arc::clone(&shared);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    if waiter.resolve(FIRED) {
                        trace!(?duration, "timeout fired");
                        action();
                    }
                }
                // `notify_one` stores a permit, so a cancel that lands
                // before this branch is first polled still wakes it.
                _ = waiter.cancelled.notified() => {
                    trace!(?duration, "timeout waiter released by cancel");
                }
            }
        });

        Self { shared, duration }
    }

    /// Suppresses the pending action.
    ///
    /// Returns `true` if this call won the race and the action will never
    /// run. Returns `false` if the timeout already fired or was already
    /// cancelled; in that case nothing changes. Safe to call any number of
    /// times, from any thread, without blocking.
    pub fn cancel(&self) -> bool {
        if self.shared.resolve(CANCELLED) {
            self.shared.cancelled.notify_one();
            trace!(duration = ?self.duration, "timeout cancelled");
            true
        } else {
            false
        }
    }

    /// Current resolution of the race.
    pub fn state(&self) -> TimeoutState {
        self.shared.load()
    }

    /// Whether the timeout has neither fired nor been cancelled.
    pub fn is_pending(&self) -> bool {
        self.state() == TimeoutState::Pending
    }

    /// The delay this timeout was started with.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}
