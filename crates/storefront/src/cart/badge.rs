//! Cart count badge.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ApiClient, Session};
use crate::events::{EventBus, Signal, StoreEvent};

/// An independently mounted "items in cart" count.
///
/// Subscribes before its first fetch so no change between the two is lost,
/// then refetches on every cart or auth change (or missed signal). The
/// background listener stops when the badge is dropped.
#[derive(Debug)]
pub struct CartBadge {
    count: watch::Receiver<u64>,
    listener: JoinHandle<()>,
}

async fn fetch_count(api: &ApiClient, session: &Session) -> u64 {
    match api.get_cart(session).await {
        Ok(cart) => cart.item_count(),
        Err(e) => {
            warn!(error = %e, "Cart count fetch failed, showing 0");
            0
        }
    }
}

impl CartBadge {
    pub async fn mount(api: ApiClient, events: &EventBus, session: Session) -> Self {
        let mut subscription = events.subscribe();
        let (tx, count) = watch::channel(fetch_count(&api, &session).await);

        let listener = tokio::spawn(async move {
            while let Some(signal) = subscription.recv().await {
                if !matches!(
                    signal,
                    Signal::Event(StoreEvent::CartChanged | StoreEvent::AuthChanged)
                        | Signal::Missed(_)
                ) {
                    continue;
                }
                debug!(?signal, "Cart badge resyncing");
                let latest = fetch_count(&api, &session).await;
                if tx.send(latest).is_err() {
                    break;
                }
            }
        });

        Self { count, listener }
    }

    /// The count as last fetched.
    #[must_use]
    pub fn count(&self) -> u64 {
        *self.count.borrow()
    }

    /// Wait until the count satisfies `predicate`, returning it.
    ///
    /// Returns `None` if the listener has stopped.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&u64) -> bool) -> Option<u64> {
        self.count.wait_for(predicate).await.ok().map(|count| *count)
    }

    /// A receiver that observes every count change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.count.clone()
    }
}

impl Drop for CartBadge {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
