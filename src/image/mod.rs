//! Per-publisher receive streams and the snapshot container that holds them.
//!
//! An [`Image`] is one publisher session's stream as seen by a subscription.
//! The subscription never creates or destroys images; the conductor attaches
//! and detaches them, and the subscription only holds shared references in an
//! [`ImageList`].

mod list;
mod memory;

use crate::types::{CorrelationId, Header, SessionId};
use std::fmt;
use std::sync::Arc;

pub use list::{ImageList, ImageSnapshot};
pub use memory::MemoryImage;

/// Callback invoked once per delivered fragment.
pub type FragmentHandler<'a> = dyn FnMut(&[u8], &Header) + 'a;

/// Shared reference to an image held by a snapshot.
pub type ImageRef = Arc<dyn Image>;

/// A single publisher session's receive stream.
pub trait Image: Send + Sync + fmt::Debug {
    /// The remote publisher instance this stream belongs to.
    fn session_id(&self) -> SessionId;

    /// The attach lifecycle this image was created for.
    fn correlation_id(&self) -> CorrelationId;

    /// Deliver at most `fragment_limit` fragments to `handler`.
    ///
    /// Returns the number of fragments delivered, which must equal the number
    /// of handler calls and never exceed `fragment_limit`.
    fn poll(&self, handler: &mut FragmentHandler<'_>, fragment_limit: usize) -> usize;
}
