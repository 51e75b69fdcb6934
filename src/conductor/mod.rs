//! The authority that registers subscriptions and releases their resources.
//!
//! A subscription hands itself back to its [`Conductor`] exactly once, on
//! close, and blocks on a [`PendingRelease`] until the conductor fulfils the
//! paired [`ReleaseSignal`].
//!
//! # Example
//!
//! ```ignore
//! let conductor = LocalConductor::new();
//! let subscription = conductor.add_subscription("udp://localhost:40123", StreamId(10));
//!
//! let image = Arc::new(MemoryImage::new(SessionId(1), CorrelationId(7), StreamId(10)));
//! conductor.on_available_image("udp://localhost:40123", StreamId(10), image.clone());
//!
//! image.offer(b"hello".to_vec());
//! subscription.poll(|data, _| println!("{:?}", data), 10);
//!
//! subscription.close();
//! ```

mod local;

use crate::error::{Result, SubscriptionError};
use crate::image::ImageSnapshot;
use crate::types::RegistrationId;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

pub use local::LocalConductor;

/// Outcome carried by a release signal.
type ReleaseOutcome = std::result::Result<(), String>;

/// Releases subscription resources on behalf of a closing subscription.
pub trait Conductor: Send + Sync {
    /// Begin releasing `registration_id`.
    ///
    /// `images` is the membership at the moment close won; the conductor is
    /// responsible for detaching them. The returned handle must eventually be
    /// fulfilled, failed, or dropped by the conductor.
    fn release_subscription(
        &self,
        registration_id: RegistrationId,
        images: ImageSnapshot,
    ) -> PendingRelease;
}

/// Create a single-shot release signal and the handle that waits on it.
pub fn release_channel() -> (ReleaseSignal, PendingRelease) {
    let (sender, receiver) = bounded(1);
    (ReleaseSignal { sender }, PendingRelease { receiver })
}

/// Conductor side of a release. Consumed on use, so it fires at most once.
#[derive(Debug)]
pub struct ReleaseSignal {
    sender: Sender<ReleaseOutcome>,
}

impl ReleaseSignal {
    /// Report that the release finished.
    pub fn complete(self) {
        // The waiter may have timed out and gone away
        let _ = self.sender.send(Ok(()));
    }

    /// Report that the release failed.
    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.sender.send(Err(reason.into()));
    }
}

/// Subscription side of a release.
#[derive(Debug)]
pub struct PendingRelease {
    receiver: Receiver<ReleaseOutcome>,
}

impl PendingRelease {
    /// A release that has already finished.
    pub fn completed() -> Self {
        let (signal, pending) = release_channel();
        signal.complete();
        pending
    }

    /// A release that has already failed.
    pub fn failed(reason: impl Into<String>) -> Self {
        let (signal, pending) = release_channel();
        signal.fail(reason);
        pending
    }

    /// Block until the conductor signals, or until `timeout` elapses.
    pub fn wait(self, timeout: Option<Duration>) -> Result<()> {
        let outcome = match timeout {
            Some(timeout) => self.receiver.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => SubscriptionError::ReleaseTimedOut(timeout),
                RecvTimeoutError::Disconnected => SubscriptionError::ReleaseAbandoned,
            })?,
            None => self
                .receiver
                .recv()
                .map_err(|_| SubscriptionError::ReleaseAbandoned)?,
        };

        outcome.map_err(SubscriptionError::ReleaseFailed)
    }
}
