//! Error types for subscription teardown.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by [`Subscription::try_close`](crate::Subscription::try_close).
///
/// Polling and membership changes never fail; only the release handshake with
/// the conductor can go wrong.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Conductor is no longer available")]
    ConductorUnavailable,

    #[error("Release signal dropped before completion")]
    ReleaseAbandoned,

    #[error("Release timed out after {0:?}")]
    ReleaseTimedOut(Duration),

    #[error("Release failed: {0}")]
    ReleaseFailed(String),
}

/// Result type for subscription operations.
pub type Result<T> = std::result::Result<T, SubscriptionError>;
