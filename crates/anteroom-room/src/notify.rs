//! Fire-and-forget delivery of lobby events to players.
//!
//! The registry decides who hears about what; a [`Notifier`] decides how
//! it gets there. Delivery happens after every lobby lock is released, so
//! an implementation may take its own locks freely, but it must not block
//! waiting on a slow client.

use anteroom_protocol::{LobbyEvent, PlayerId};
use tokio::sync::mpsc;

/// Sends one event to a set of players.
///
/// # Trait bounds
///
/// - `Send + Sync` → called concurrently from every request handler and
///   from ready-timeout tasks.
/// - `'static` → owned by the registry for its whole life.
pub trait Notifier: Send + Sync + 'static {
    /// Queues `event` for each of `recipients`. Must not block; failures
    /// are the implementation's to log and drop.
    fn notify(&self, recipients: &[PlayerId], event: LobbyEvent);
}

/// One queued delivery, as produced by [`ChannelNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipients: Vec<PlayerId>,
    pub event: LobbyEvent,
}

/// A [`Notifier`] that pushes every delivery onto an unbounded channel.
///
/// The receiving half is typically drained by the transport layer, which
/// fans each [`Notification`] out to the recipients' connections. Tests
/// drain it directly to assert on what was sent.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, recipients: &[PlayerId], event: LobbyEvent) {
        if recipients.is_empty() {
            return;
        }
        let notification = Notification {
            recipients: recipients.to_vec(),
            event,
        };
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification receiver dropped, event discarded");
        }
    }
}
