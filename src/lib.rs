//! # rxmux
//!
//! Receive-side multiplexing for a low-latency messaging client.
//!
//! ## Core Concepts
//!
//! - **Images**: One receive stream per remote publisher session
//! - **Subscriptions**: Every image on a channel and stream, drained fairly
//!   under a fragment budget
//! - **Conductor**: The authority that attaches images and releases
//!   subscriptions on close
//!
//! ## Example
//!
//! ```ignore
//! use rxmux::{LocalConductor, MemoryImage, SessionId, CorrelationId, StreamId};
//!
//! let conductor = LocalConductor::new();
//! let subscription = conductor.add_subscription("aeron:ipc", StreamId(10));
//!
//! // A publisher showed up
//! let image = Arc::new(MemoryImage::new(SessionId(1), CorrelationId(1), StreamId(10)));
//! conductor.on_available_image("aeron:ipc", StreamId(10), image.clone());
//!
//! image.offer(b"hello".to_vec());
//! let read = subscription.poll(|data, header| println!("{:?} {:?}", data, header), 10);
//!
//! subscription.close();
//! ```

pub mod conductor;
pub mod error;
pub mod image;
pub mod subscription;
pub mod types;

// Re-exports
pub use conductor::{release_channel, Conductor, LocalConductor, PendingRelease, ReleaseSignal};
pub use error::{Result, SubscriptionError};
pub use image::{FragmentHandler, Image, ImageList, ImageRef, ImageSnapshot, MemoryImage};
pub use subscription::{
    is_connected_to, ImageSummary, Subscription, SubscriptionConfig, SubscriptionSummary,
};
pub use types::*;
