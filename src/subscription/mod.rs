//! Subscriptions: fair, lock-free draining of every image on a channel and stream.
//!
//! A [`Subscription`] is created by a conductor with an empty membership.
//! The conductor attaches an image for each matching publisher it discovers
//! and detaches it when the publisher goes away. The application polls:
//!
//! - Each poll reads one snapshot of the membership and never blocks
//! - The starting image rotates between polls, so a small fragment budget
//!   cannot starve images late in the list
//! - Close is idempotent and hands teardown back to the conductor
//!
//! # Example
//!
//! ```ignore
//! let subscription = conductor.add_subscription("udp://localhost:40123", StreamId(10));
//!
//! loop {
//!     let read = subscription.poll(|data, header| handle(data, header), 10);
//!     if read == 0 {
//!         idle();
//!     }
//! }
//! ```

mod subscriber;
mod types;

pub use subscriber::{is_connected_to, Subscription};
pub use types::{ImageSummary, SubscriptionConfig, SubscriptionSummary};
