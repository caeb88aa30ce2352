//! In-process event bus for cross-view synchronisation.
//!
//! Publishers fire a named signal and move on. Subscribers decide on their
//! own whether to refetch. There is no acknowledgement, no ordering across
//! subscribers, and no history: a subscriber only sees events published
//! after it subscribed.

use tokio::sync::broadcast;
use tracing::debug;

/// Buffer per subscriber before it starts missing events.
const DEFAULT_CAPACITY: usize = 64;

/// Signals published on the [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    /// The caller's cart changed on the backend.
    CartChanged,
    /// The caller logged in or out.
    AuthChanged,
}

impl StoreEvent {
    /// Wire name, as used for the browser-side `HX-Trigger` header.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CartChanged => "cart:changed",
            Self::AuthChanged => "auth:changed",
        }
    }
}

impl std::fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a subscriber receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Event(StoreEvent),
    /// The subscriber fell behind and `n` events were dropped. Treat as
    /// "anything may have changed" and resync.
    Missed(u64),
}

/// Process-wide fire-and-forget broadcast.
///
/// Cheap to clone; every clone publishes to the same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fire `event` at every current subscriber.
    ///
    /// Returns how many subscribers were listening. Zero is not an error.
    pub fn publish(&self, event: StoreEvent) -> usize {
        let listeners = self.sender.send(event).unwrap_or(0);
        debug!(event = %event, listeners, "Published store event");
        listeners
    }

    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// One listener's view of the bus.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<StoreEvent>,
}

impl Subscription {
    /// Wait for the next signal. Returns `None` once every [`EventBus`]
    /// handle has been dropped.
    pub async fn recv(&mut self) -> Option<Signal> {
        match self.receiver.recv().await {
            Ok(event) => Some(Signal::Event(event)),
            Err(broadcast::error::RecvError::Lagged(n)) => Some(Signal::Missed(n)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Take the next pending signal without waiting.
    pub fn try_recv(&mut self) -> Option<Signal> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Signal::Event(event)),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Some(Signal::Missed(n)),
            Err(
                broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
            ) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_listeners_is_fine() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(StoreEvent::CartChanged), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_the_event() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.publish(StoreEvent::AuthChanged), 2);
        assert_eq!(a.recv().await, Some(Signal::Event(StoreEvent::AuthChanged)));
        assert_eq!(b.recv().await, Some(Signal::Event(StoreEvent::AuthChanged)));
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_no_history() {
        let bus = EventBus::new();
        bus.publish(StoreEvent::CartChanged);

        let mut late = bus.subscribe();
        assert_eq!(late.try_recv(), None);

        bus.publish(StoreEvent::AuthChanged);
        assert_eq!(late.recv().await, Some(Signal::Event(StoreEvent::AuthChanged)));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_is_told_to_resync() {
        let bus = EventBus::with_capacity(2);
        let mut slow = bus.subscribe();
        for _ in 0..5 {
            bus.publish(StoreEvent::CartChanged);
        }
        assert_eq!(slow.recv().await, Some(Signal::Missed(3)));
        assert_eq!(slow.recv().await, Some(Signal::Event(StoreEvent::CartChanged)));
    }

    #[test]
    fn test_dropped_subscription_detaches() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_recv_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        drop(bus);
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(StoreEvent::CartChanged.to_string(), "cart:changed");
        assert_eq!(StoreEvent::AuthChanged.name(), "auth:changed");
    }
}
