//! Synchronous event delivery from the wallet to interested views.
//!
//! Subscribers hold a [`Subscription`]; dropping it unregisters the handler.

use core::fmt;

use log::*;

use crate::domain::{LnChannel, WalletId};
use crate::prelude::*;

/// An event raised by the wallet's Lightning engine
#[derive(Clone)]
pub enum WalletEvent {
    /// A single channel changed
    ChannelUpdated {
        /// The wallet owning the channel
        wallet: WalletId,
        /// The channel, in its current state
        channel: Arc<dyn LnChannel>,
    },
    /// The set of channels changed, views should reload
    ChannelsUpdated {
        /// The wallet whose channels changed
        wallet: WalletId,
    },
}

impl WalletEvent {
    /// The wallet this event concerns
    pub fn wallet(&self) -> &WalletId {
        match self {
            WalletEvent::ChannelUpdated { wallet, .. } => wallet,
            WalletEvent::ChannelsUpdated { wallet } => wallet,
        }
    }
}

impl fmt::Debug for WalletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletEvent::ChannelUpdated { wallet, channel } => f
                .debug_struct("ChannelUpdated")
                .field("wallet", wallet)
                .field("channel", &channel.channel_id())
                .finish(),
            WalletEvent::ChannelsUpdated { wallet } => {
                f.debug_struct("ChannelsUpdated").field("wallet", wallet).finish()
            }
        }
    }
}

/// An event handler
pub type EventHandler = Arc<dyn Fn(&WalletEvent) + Send + Sync>;

struct Registry {
    next_id: u64,
    handlers: OrderedMap<u64, EventHandler>,
}

/// Fan-out of wallet events to subscribers.
///
/// Cloning is cheap and yields a handle to the same bus.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        EventBus {
            registry: Arc::new(Mutex::new(Registry { next_id: 0, handlers: OrderedMap::new() })),
        }
    }

    /// Register a handler.  It stays registered while the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, handler: EventHandler) -> Subscription {
        let mut registry = self.registry.lock().unwrap();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.insert(id, handler);
        trace!("subscribed handler {}", id);
        Subscription { id, registry: Arc::downgrade(&self.registry) }
    }

    /// Deliver an event to all current subscribers, in subscription order
    pub fn publish(&self, event: WalletEvent) {
        // snapshot, so handlers can (un)subscribe during delivery
        let handlers: Vec<EventHandler> =
            self.registry.lock().unwrap().handlers.values().cloned().collect();
        debug!("publish {:?} to {} subscribers", event, handlers.len());
        for handler in handlers {
            handler(&event);
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().unwrap().handlers.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A registration on an [`EventBus`], released on drop
#[must_use = "the handler is unregistered when the subscription is dropped"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Unregister now
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            // the handler is dropped outside the lock, it may own other subscriptions
            let removed = registry.lock().ok().and_then(|mut r| r.handlers.remove(&self.id));
            if removed.is_some() {
                trace!("unsubscribed handler {}", self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_log::test;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> EventHandler {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &WalletEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn reload(name: &str) -> WalletEvent {
        WalletEvent::ChannelsUpdated { wallet: WalletId::new(name) }
    }

    #[test]
    fn publish_reaches_subscribers_test() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let _s1 = bus.subscribe(counting_handler(&counter));
        let _s2 = bus.subscribe(counting_handler(&counter));
        bus.publish(reload("w1"));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn drop_unsubscribes_test() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let sub = bus.subscribe(counting_handler(&counter));
        assert_eq!(bus.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(reload("w1"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscription_outlives_bus_test() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let sub = bus.subscribe(counting_handler(&counter));
        drop(bus);
        drop(sub);
    }

    #[test]
    fn subscribe_during_delivery_test() {
        let bus = EventBus::new();
        let late: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let counter = Arc::new(AtomicUsize::new(0));
        let bus1 = bus.clone();
        let late1 = Arc::clone(&late);
        let counter1 = Arc::clone(&counter);
        let _s = bus.subscribe(Arc::new(move |_: &WalletEvent| {
            let sub = bus1.subscribe(counting_handler(&counter1));
            late1.lock().unwrap().push(sub);
        }));
        bus.publish(reload("w1"));
        // the late subscriber was not part of the first delivery
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(), 2);
        bus.publish(reload("w1"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
