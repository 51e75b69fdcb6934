//! In-memory image backed by a fragment queue.

use super::{FragmentHandler, Image};
use crate::types::{CorrelationId, Header, SessionId, StreamId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};

/// Image whose fragments are offered directly by the caller.
///
/// Useful for embedding a subscription without a transport, and for tests.
#[derive(Debug)]
pub struct MemoryImage {
    session_id: SessionId,
    correlation_id: CorrelationId,
    stream_id: StreamId,
    fragments: Mutex<VecDeque<Vec<u8>>>,
    /// Bytes consumed so far.
    position: AtomicI64,
}

impl MemoryImage {
    pub fn new(session_id: SessionId, correlation_id: CorrelationId, stream_id: StreamId) -> Self {
        Self {
            session_id,
            correlation_id,
            stream_id,
            fragments: Mutex::new(VecDeque::new()),
            position: AtomicI64::new(0),
        }
    }

    /// Queue a fragment for delivery.
    pub fn offer(&self, payload: impl Into<Vec<u8>>) {
        self.fragments.lock().push_back(payload.into());
    }

    /// Number of fragments waiting to be polled.
    pub fn pending(&self) -> usize {
        self.fragments.lock().len()
    }

    /// Stream position after the last delivered fragment.
    pub fn position(&self) -> i64 {
        self.position.load(Ordering::Acquire)
    }
}

impl Image for MemoryImage {
    fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    fn poll(&self, handler: &mut FragmentHandler<'_>, fragment_limit: usize) -> usize {
        let mut delivered = 0;
        while delivered < fragment_limit {
            // Lock released before the handler runs
            let Some(fragment) = self.fragments.lock().pop_front() else {
                break;
            };
            let position = self
                .position
                .fetch_add(fragment.len() as i64, Ordering::AcqRel)
                + fragment.len() as i64;
            let header = Header {
                session_id: self.session_id,
                stream_id: self.stream_id,
                position,
            };
            handler(&fragment[..], &header);
            delivered += 1;
        }
        delivered
    }
}
