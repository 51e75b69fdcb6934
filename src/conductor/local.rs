//! In-process conductor that owns a registry of subscriptions.

use super::{release_channel, Conductor, PendingRelease};
use crate::image::{ImageRef, ImageSnapshot};
use crate::subscription::{Subscription, SubscriptionConfig};
use crate::types::{CorrelationId, RegistrationId, StreamId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Registers subscriptions and routes image availability to them.
///
/// All membership changes go through `write_lock`, so each subscription sees
/// a single writer.
pub struct LocalConductor {
    /// Handed to subscriptions so they can release through us.
    self_ref: Weak<LocalConductor>,
    /// Open subscriptions by registration id.
    subscriptions: RwLock<HashMap<RegistrationId, Arc<Subscription>>>,
    /// Counter for issuing registration ids.
    next_id: AtomicI64,
    /// Serializes image attach and detach.
    write_lock: Mutex<()>,
    /// Config given to every subscription created here.
    config: SubscriptionConfig,
}

impl LocalConductor {
    /// Create a conductor with default subscription config.
    pub fn new() -> Arc<Self> {
        Self::with_config(SubscriptionConfig::default())
    }

    /// Create a conductor whose subscriptions use `config`.
    pub fn with_config(config: SubscriptionConfig) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            write_lock: Mutex::new(()),
            config,
        })
    }

    /// Register a new subscription on `channel` and `stream_id`.
    pub fn add_subscription(&self, channel: &str, stream_id: StreamId) -> Arc<Subscription> {
        let registration_id = RegistrationId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let conductor: Weak<dyn Conductor> = self.self_ref.clone();

        let subscription = Arc::new(Subscription::new(
            conductor,
            channel,
            registration_id,
            stream_id,
            self.config.clone(),
        ));

        self.subscriptions
            .write()
            .insert(registration_id, Arc::clone(&subscription));

        info!(
            registration_id = %registration_id,
            channel = channel,
            stream_id = %stream_id,
            "Subscription registered"
        );
        subscription
    }

    /// Look up an open subscription.
    pub fn find_subscription(&self, registration_id: RegistrationId) -> Option<Arc<Subscription>> {
        self.subscriptions.read().get(&registration_id).cloned()
    }

    /// Number of open subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// A publisher's stream became available.
    ///
    /// Attaches `image` to every open subscription on the same channel and
    /// stream that does not already hold its session. Returns how many
    /// subscriptions took it.
    pub fn on_available_image(&self, channel: &str, stream_id: StreamId, image: ImageRef) -> usize {
        let _lock = self.write_lock.lock();

        let subs = self.subscriptions.read();
        let mut attached = 0;
        for sub in subs.values() {
            if sub.is_closed() || sub.channel() != channel || sub.stream_id() != stream_id {
                continue;
            }
            if sub.add_image_if_absent(Arc::clone(&image)) {
                attached += 1;
            }
        }

        debug!(
            session_id = %image.session_id(),
            correlation_id = %image.correlation_id(),
            attached,
            "Image available"
        );
        attached
    }

    /// A publisher's stream went away.
    ///
    /// Detaches the image from every subscription holding it and returns how
    /// many did.
    pub fn on_unavailable_image(&self, correlation_id: CorrelationId) -> usize {
        let _lock = self.write_lock.lock();

        let detached = self
            .subscriptions
            .read()
            .values()
            .filter(|sub| sub.remove_image(correlation_id).is_some())
            .count();

        debug!(correlation_id = %correlation_id, detached, "Image unavailable");
        detached
    }
}

impl Conductor for LocalConductor {
    fn release_subscription(
        &self,
        registration_id: RegistrationId,
        images: ImageSnapshot,
    ) -> PendingRelease {
        let (signal, pending) = release_channel();

        let removed = self.subscriptions.write().remove(&registration_id);
        let Some(subscription) = removed else {
            warn!(registration_id = %registration_id, "Release of unknown subscription");
            signal.fail(format!("unknown subscription {}", registration_id));
            return pending;
        };

        {
            let _lock = self.write_lock.lock();
            for image in images.iter() {
                subscription.remove_image(image.correlation_id());
            }
            // An attach that was in flight when close won may have landed
            // after the snapshot was taken
            for image in subscription.images().iter() {
                subscription.remove_image(image.correlation_id());
            }
        }

        debug!(
            registration_id = %registration_id,
            images = images.len(),
            "Subscription released"
        );
        signal.complete();
        pending
    }
}
