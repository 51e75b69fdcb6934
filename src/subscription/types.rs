//! Subscription configuration and diagnostic summaries.

use crate::types::{CorrelationId, RegistrationId, SessionId, StreamId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a subscription.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionConfig {
    /// How long close waits for the conductor to finish releasing.
    /// Default: None (wait until signalled)
    pub release_timeout: Option<Duration>,
}

/// Point-in-time description of a subscription.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub registration_id: RegistrationId,
    pub channel: String,
    pub stream_id: StreamId,
    pub closed: bool,
    pub images: Vec<ImageSummary>,
}

/// Identity of one attached image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub session_id: SessionId,
    pub correlation_id: CorrelationId,
}
