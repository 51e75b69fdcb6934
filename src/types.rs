//! Core identifier types shared by subscriptions, images and conductors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a remote publisher instance within a stream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub i32);

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one attach/detach lifecycle of an image.
///
/// Unlike [`SessionId`], a correlation id is never reused, so it is the key
/// used to detach an image.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub i64);

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CorrelationId({})", self.0)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the conductor assigns to a subscription at registration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistrationId(pub i64);

impl fmt::Debug for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistrationId({})", self.0)
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical stream number within a channel.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(pub i32);

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamId({})", self.0)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata handed to a fragment handler alongside each payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub session_id: SessionId,
    pub stream_id: StreamId,
    /// Stream position just past the end of this fragment.
    pub position: i64,
}

/// Send-side identity of a publication.
///
/// Only the fields needed to decide whether a subscription is receiving from
/// it; the send path itself lives elsewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Publication {
    channel: String,
    stream_id: StreamId,
    session_id: SessionId,
    registration_id: RegistrationId,
}

impl Publication {
    pub fn new(
        channel: impl Into<String>,
        stream_id: StreamId,
        session_id: SessionId,
        registration_id: RegistrationId,
    ) -> Self {
        Self {
            channel: channel.into(),
            stream_id,
            session_id,
            registration_id,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn registration_id(&self) -> RegistrationId {
        self.registration_id
    }
}
