//! The subscription itself: identity, membership, fair poll and close.

use crate::conductor::Conductor;
use crate::error::{Result, SubscriptionError};
use crate::image::{ImageList, ImageRef, ImageSnapshot};
use crate::types::{CorrelationId, Header, Publication, RegistrationId, SessionId, StreamId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;
use tracing::{debug, info, warn};

use super::types::{ImageSummary, SubscriptionConfig, SubscriptionSummary};

/// Aggregates every image on one channel and stream.
///
/// Readers (`poll`, `has_image`, `has_images`, [`is_connected_to`]) each work
/// on one atomically loaded snapshot and never block. Membership is changed
/// only by the conductor.
pub struct Subscription {
    conductor: Weak<dyn Conductor>,
    channel: String,
    stream_id: StreamId,
    registration_id: RegistrationId,
    config: SubscriptionConfig,
    /// Round-robin start index. Taken with `try_lock`, so a second poller
    /// is turned away instead of racing on the cursor.
    poll_cursor: Mutex<usize>,
    images: ImageList,
    closed: AtomicBool,
}

impl Subscription {
    /// Create an open subscription with no images.
    pub fn new(
        conductor: Weak<dyn Conductor>,
        channel: impl Into<String>,
        registration_id: RegistrationId,
        stream_id: StreamId,
        config: SubscriptionConfig,
    ) -> Self {
        Self {
            conductor,
            channel: channel.into(),
            stream_id,
            registration_id,
            config,
            poll_cursor: Mutex::new(0),
            images: ImageList::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn registration_id(&self) -> RegistrationId {
        self.registration_id
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // --- Polling ---

    /// Deliver up to `fragment_limit` fragments from the attached images.
    ///
    /// Images are visited starting one past where the previous poll started,
    /// wrapping around, and each is asked for whatever budget remains. Returns
    /// the number of fragments delivered.
    ///
    /// Only one poll may run at a time. A poll that overlaps another one,
    /// including a poll issued from inside `handler`, delivers nothing and
    /// returns 0.
    pub fn poll<F>(&self, mut handler: F, fragment_limit: usize) -> usize
    where
        F: FnMut(&[u8], &Header),
    {
        let images = self.images.get();
        let length = images.len();
        if length == 0 {
            return 0;
        }

        let Some(mut cursor) = self.poll_cursor.try_lock() else {
            debug!(
                registration_id = %self.registration_id,
                "Concurrent poll rejected"
            );
            return 0;
        };

        let mut start = *cursor;
        *cursor += 1;
        if start >= length {
            // Membership shrank since the last poll
            start = 0;
            *cursor = 0;
        }

        let mut fragments_read = 0;
        for image in images[start..].iter().chain(images[..start].iter()) {
            if fragments_read >= fragment_limit {
                break;
            }
            let remaining = fragment_limit - fragments_read;
            let read = image.poll(&mut handler, remaining);
            debug_assert!(
                read <= remaining,
                "image {:?} delivered {} fragments with a budget of {}",
                image,
                read,
                remaining
            );
            fragments_read += read;
        }

        fragments_read
    }

    // --- Membership ---

    /// Whether an image for `session_id` is attached.
    pub fn has_image(&self, session_id: SessionId) -> bool {
        self.images.contains_session(session_id)
    }

    /// Whether any image is attached.
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Owned snapshot of the attached images.
    pub fn images(&self) -> ImageSnapshot {
        self.images.snapshot()
    }

    pub fn image_by_session_id(&self, session_id: SessionId) -> Option<ImageRef> {
        self.images.find_session(session_id)
    }

    /// Image at `index` in the current snapshot. Indices shift as images
    /// come and go.
    pub fn image_at(&self, index: usize) -> Option<ImageRef> {
        self.images.get().get(index).cloned()
    }

    /// Attach an image.
    ///
    /// Does not check for an existing image with the same session; call
    /// [`has_image`](Self::has_image) first or use
    /// [`add_image_if_absent`](Self::add_image_if_absent).
    pub fn add_image(&self, image: ImageRef) {
        debug!(
            registration_id = %self.registration_id,
            session_id = %image.session_id(),
            correlation_id = %image.correlation_id(),
            "Adding image"
        );
        self.images.push(image);
    }

    /// Attach an image unless its session is already present.
    ///
    /// Returns whether the image was attached.
    pub fn add_image_if_absent(&self, image: ImageRef) -> bool {
        let session_id = image.session_id();
        let correlation_id = image.correlation_id();
        let added = self.images.push_unique(image);
        if added {
            debug!(
                registration_id = %self.registration_id,
                session_id = %session_id,
                correlation_id = %correlation_id,
                "Adding image"
            );
        }
        added
    }

    /// Detach the image for `correlation_id`, returning it if it was attached.
    pub fn remove_image(&self, correlation_id: CorrelationId) -> Option<ImageRef> {
        let removed = self.images.remove(correlation_id);
        if let Some(image) = &removed {
            debug!(
                registration_id = %self.registration_id,
                session_id = %image.session_id(),
                correlation_id = %correlation_id,
                "Removing image"
            );
        }
        removed
    }

    // --- Lifecycle ---

    /// Close the subscription.
    ///
    /// Only the first call does anything: it hands the current images to the
    /// conductor and waits for the release to finish. Release failures are
    /// logged, never returned; use [`try_close`](Self::try_close) to see them.
    pub fn close(&self) {
        if let Err(e) = self.try_close() {
            warn!(
                registration_id = %self.registration_id,
                error = %e,
                "Subscription release failed"
            );
        }
    }

    /// Close the subscription and report how the release went.
    ///
    /// Returns `Ok(true)` if this call performed the release and `Ok(false)`
    /// if the subscription was already closed. The subscription stays closed
    /// even when an error is returned.
    pub fn try_close(&self) -> Result<bool> {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        let conductor = self
            .conductor
            .upgrade()
            .ok_or(SubscriptionError::ConductorUnavailable)?;
        let images = self.images.snapshot();

        debug!(
            registration_id = %self.registration_id,
            images = images.len(),
            "Releasing subscription"
        );
        conductor
            .release_subscription(self.registration_id, images)
            .wait(self.config.release_timeout)?;

        info!(
            registration_id = %self.registration_id,
            channel = %self.channel,
            stream_id = %self.stream_id,
            "Subscription closed"
        );
        Ok(true)
    }

    // --- Diagnostics ---

    pub fn summary(&self) -> SubscriptionSummary {
        SubscriptionSummary {
            registration_id: self.registration_id,
            channel: self.channel.clone(),
            stream_id: self.stream_id,
            closed: self.is_closed(),
            images: self
                .images
                .get()
                .iter()
                .map(|image| ImageSummary {
                    session_id: image.session_id(),
                    correlation_id: image.correlation_id(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("registration_id", &self.registration_id)
            .field("channel", &self.channel)
            .field("stream_id", &self.stream_id)
            .field("images", &self.images.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Whether `subscription` is receiving from `publication`.
///
/// True when channel and stream match and an image for the publication's
/// session is attached.
pub fn is_connected_to(subscription: &Subscription, publication: &Publication) -> bool {
    let images = subscription.images.get();
    subscription.channel == publication.channel()
        && subscription.stream_id == publication.stream_id()
        && images
            .iter()
            .any(|image| image.session_id() == publication.session_id())
}
