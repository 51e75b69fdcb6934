//! Copy-on-write image membership.
//!
//! Readers load the current snapshot without locking or allocating. Writers
//! build a fresh vector and publish it with a compare-and-swap, retrying
//! against the latest snapshot when another writer got there first, so
//! concurrent mutations are never lost.

use super::ImageRef;
use crate::types::{CorrelationId, SessionId};
use arc_swap::{ArcSwap, Guard};
use std::sync::Arc;

/// Immutable, shareable view of an image membership.
pub type ImageSnapshot = Arc<Vec<ImageRef>>;

/// Atomically replaceable snapshot of images.
pub struct ImageList {
    current: ArcSwap<Vec<ImageRef>>,
}

impl ImageList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Borrow the current snapshot.
    ///
    /// Never blocks and never allocates. Hold the guard only for the duration
    /// of a single operation; use [`snapshot`](Self::snapshot) to keep it.
    pub fn get(&self) -> Guard<ImageSnapshot> {
        self.current.load()
    }

    /// Owned handle to the current snapshot.
    pub fn snapshot(&self) -> ImageSnapshot {
        self.current.load_full()
    }

    /// Replace the whole snapshot. Last writer wins.
    pub fn set(&self, images: Vec<ImageRef>) {
        self.current.store(Arc::new(images));
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Whether any image in the current snapshot belongs to `session_id`.
    pub fn contains_session(&self, session_id: SessionId) -> bool {
        self.current
            .load()
            .iter()
            .any(|image| image.session_id() == session_id)
    }

    /// Find the image for `session_id` in the current snapshot.
    pub fn find_session(&self, session_id: SessionId) -> Option<ImageRef> {
        self.current
            .load()
            .iter()
            .find(|image| image.session_id() == session_id)
            .cloned()
    }

    /// Append an image.
    pub fn push(&self, image: ImageRef) {
        self.update(|images| {
            let mut next = Vec::with_capacity(images.len() + 1);
            next.extend(images.iter().cloned());
            next.push(Arc::clone(&image));
            (Some(next), ())
        })
    }

    /// Append an image unless one with the same session is already present.
    ///
    /// The check and the append are published as one step. Returns whether
    /// the image was added.
    pub fn push_unique(&self, image: ImageRef) -> bool {
        let session_id = image.session_id();
        self.update(|images| {
            if images.iter().any(|held| held.session_id() == session_id) {
                return (None, false);
            }
            let mut next = Vec::with_capacity(images.len() + 1);
            next.extend(images.iter().cloned());
            next.push(Arc::clone(&image));
            (Some(next), true)
        })
    }

    /// Remove the image with `correlation_id`.
    ///
    /// The last image is moved into the vacated slot, so the relative order
    /// of the remaining images is not preserved.
    pub fn remove(&self, correlation_id: CorrelationId) -> Option<ImageRef> {
        self.update(|images| {
            match images
                .iter()
                .position(|image| image.correlation_id() == correlation_id)
            {
                Some(index) => {
                    let mut next = images.to_vec();
                    let removed = next.swap_remove(index);
                    (Some(next), Some(removed))
                }
                None => (None, None),
            }
        })
    }

    /// Compare-and-swap loop. `f` returns the replacement (or `None` to leave
    /// the snapshot alone) and a result; it may run more than once.
    fn update<F, R>(&self, mut f: F) -> R
    where
        F: FnMut(&[ImageRef]) -> (Option<Vec<ImageRef>>, R),
    {
        let mut current = self.current.load();
        loop {
            let (next, result) = f(&current);
            let Some(next) = next else {
                return result;
            };
            let prev = self.current.compare_and_swap(&*current, Arc::new(next));
            if Arc::ptr_eq(&*current, &*prev) {
                return result;
            }
            current = prev;
        }
    }
}

impl Default for ImageList {
    fn default() -> Self {
        Self::new()
    }
}
