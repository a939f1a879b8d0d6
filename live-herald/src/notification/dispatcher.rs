use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::channels::DeliveryChannel;
use crate::subscribers::{SubscriberId, SubscriberStore};

/// Default pause between two sends.
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(50);

/// Fans one message out to many subscribers.
///
/// Each recipient is attempted independently. Permanently unreachable
/// recipients are pruned from the store; transient failures are skipped
/// and retried on the next broadcast.
pub struct BroadcastDispatcher {
    channel: Arc<dyn DeliveryChannel>,
    store: Arc<dyn SubscriberStore>,
    send_delay: Duration,
}

impl BroadcastDispatcher {
    pub fn new(channel: Arc<dyn DeliveryChannel>, store: Arc<dyn SubscriberStore>) -> Self {
        Self {
            channel,
            store,
            send_delay: DEFAULT_SEND_DELAY,
        }
    }

    pub fn with_send_delay(mut self, send_delay: Duration) -> Self {
        self.send_delay = send_delay;
        self
    }

    /// Deliver `message` to the current store membership.
    pub async fn broadcast_all(&self, message: &str) -> usize {
        let recipients = match self.store.list().await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(error = %e, "Subscriber store unreadable, broadcasting to nobody");
                HashSet::new()
            }
        };
        self.broadcast(message, &recipients).await
    }

    /// Deliver `message` to every recipient and return how many succeeded.
    pub async fn broadcast(&self, message: &str, recipients: &HashSet<SubscriberId>) -> usize {
        let mut ordered: Vec<SubscriberId> = recipients.iter().copied().collect();
        ordered.sort_unstable();

        let mut delivered = 0;
        let mut pruned = 0;
        let mut skipped = 0;

        for (i, recipient) in ordered.into_iter().enumerate() {
            if i > 0 && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }

            match self.channel.deliver(recipient, message).await {
                Ok(()) => delivered += 1,
                Err(e) if e.is_permanent() => {
                    warn!(
                        subscriber = %recipient,
                        channel = self.channel.channel_type(),
                        error = %e,
                        "Subscriber unreachable, pruning"
                    );
                    pruned += 1;
                    if let Err(store_err) = self.store.remove(recipient).await {
                        error!(subscriber = %recipient, error = %store_err, "Failed to prune subscriber");
                    }
                }
                Err(e) => {
                    debug!(
                        subscriber = %recipient,
                        channel = self.channel.channel_type(),
                        error = %e,
                        "Delivery failed, skipping this round"
                    );
                    skipped += 1;
                }
            }
        }

        info!(
            delivered,
            pruned,
            skipped,
            total = recipients.len(),
            "Broadcast finished"
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::notification::testing::RecordingChannel;
    use crate::subscribers::MemoryStore;

    fn ids(raw: &[i64]) -> HashSet<SubscriberId> {
        raw.iter().copied().map(SubscriberId).collect()
    }

    #[tokio::test]
    async fn test_all_deliveries_succeed() {
        let channel = Arc::new(RecordingChannel::new());
        let store = Arc::new(MemoryStore::with_subscribers(ids(&[3, 1, 2])));
        let dispatcher = BroadcastDispatcher::new(channel.clone(), store.clone())
            .with_send_delay(Duration::ZERO);

        let delivered = dispatcher.broadcast_all("hello").await;

        assert_eq!(delivered, 3);
        assert_eq!(store.list().await.unwrap(), ids(&[1, 2, 3]));
        assert_eq!(
            channel.recipients(),
            vec![SubscriberId(1), SubscriberId(2), SubscriberId(3)]
        );
    }

    #[tokio::test]
    async fn test_permanent_failure_prunes_transient_keeps() {
        let channel = Arc::new(
            RecordingChannel::new()
                .fail_permanently(SubscriberId(2))
                .fail_transiently(SubscriberId(4)),
        );
        let store = Arc::new(MemoryStore::with_subscribers(ids(&[1, 2, 3, 4, 5])));
        let dispatcher = BroadcastDispatcher::new(channel.clone(), store.clone())
            .with_send_delay(Duration::ZERO);

        let delivered = dispatcher.broadcast_all("hello").await;

        assert_eq!(delivered, 3);
        assert_eq!(store.list().await.unwrap(), ids(&[1, 3, 4, 5]));
        assert_eq!(channel.recipients().len(), 5);
    }

    #[tokio::test]
    async fn test_explicit_recipients_bypass_store_listing() {
        let channel = Arc::new(RecordingChannel::new());
        let store = Arc::new(MemoryStore::new());
        let dispatcher = BroadcastDispatcher::new(channel.clone(), store)
            .with_send_delay(Duration::ZERO);

        assert_eq!(dispatcher.broadcast("hi", &ids(&[9])).await, 1);
        assert_eq!(dispatcher.broadcast("hi", &HashSet::new()).await, 0);
        assert_eq!(channel.messages(), vec!["hi".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_are_spaced_by_delay() {
        let channel = Arc::new(RecordingChannel::new());
        let store = Arc::new(MemoryStore::with_subscribers(ids(&[1, 2, 3])));
        let dispatcher = BroadcastDispatcher::new(channel, store);

        let started = tokio::time::Instant::now();
        dispatcher.broadcast_all("hello").await;

        assert!(started.elapsed() >= DEFAULT_SEND_DELAY * 2);
    }
}
