//! The [`Herald`] facade: everything the command layer needs in one place.

use std::sync::Arc;
use std::time::Duration;

use live_probe::{LiveDetector, LiveProbe, LiveRead};
use tracing::info;

use crate::Result;
use crate::config::HeraldConfig;
use crate::monitor::{DEFAULT_CHECK_INTERVAL, TransitionWatcher};
use crate::notification::{
    BroadcastDispatcher, DeliveryChannel, MessageTemplates, TelegramChannel,
};
use crate::subscribers::{JsonFileStore, SubscriberId, SubscriberStore};

pub struct Herald {
    store: Arc<dyn SubscriberStore>,
    probe: Arc<dyn LiveProbe>,
    channel: Arc<dyn DeliveryChannel>,
    dispatcher: Arc<BroadcastDispatcher>,
    templates: MessageTemplates,
    check_interval: Duration,
}

impl Herald {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        probe: Arc<dyn LiveProbe>,
        channel: Arc<dyn DeliveryChannel>,
        templates: MessageTemplates,
    ) -> Self {
        let dispatcher = Arc::new(BroadcastDispatcher::new(
            Arc::clone(&channel),
            Arc::clone(&store),
        ));
        Self {
            store,
            probe,
            channel,
            dispatcher,
            templates,
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &HeraldConfig) -> Result<Self> {
        let store = Arc::new(JsonFileStore::new(&config.subscribers_file));
        let probe = Arc::new(LiveDetector::new(config.detector_config())?);
        let channel = Arc::new(TelegramChannel::new(config.telegram_config())?);
        let templates = MessageTemplates::new(&config.streamer_name, &config.target_url);

        info!(
            url = %config.target_url,
            subscribers_file = %config.subscribers_file.display(),
            interval = ?config.check_interval,
            "Herald configured"
        );

        Ok(Self::new(store, probe, channel, templates)
            .with_send_delay(config.send_delay)
            .with_check_interval(config.check_interval))
    }

    pub fn with_send_delay(mut self, send_delay: Duration) -> Self {
        self.dispatcher = Arc::new(
            BroadcastDispatcher::new(Arc::clone(&self.channel), Arc::clone(&self.store))
                .with_send_delay(send_delay),
        );
        self
    }

    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    /// Returns `true` when `id` was not subscribed yet.
    pub async fn subscribe(&self, id: SubscriberId) -> Result<bool> {
        Ok(self.store.add(id).await?)
    }

    /// Returns `true` when `id` was subscribed.
    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<bool> {
        Ok(self.store.remove(id).await?)
    }

    pub async fn subscribers(&self) -> Result<Vec<SubscriberId>> {
        let mut ids: Vec<_> = self.store.list().await?.into_iter().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Fresh live read of the watched page.
    pub async fn query(&self) -> LiveRead {
        self.probe.read().await
    }

    /// Fresh read rendered as a reply message.
    pub async fn status_text(&self) -> String {
        let read = self.query().await;
        self.templates.status(&read)
    }

    /// Admin broadcast to every subscriber; returns the delivered count.
    pub async fn broadcast(&self, message: &str) -> usize {
        self.dispatcher.broadcast_all(message).await
    }

    /// Build the transition watcher sharing this herald's collaborators.
    pub fn watcher(&self) -> TransitionWatcher {
        TransitionWatcher::new(
            Arc::clone(&self.probe),
            Arc::clone(&self.dispatcher),
            self.templates.clone(),
        )
        .with_check_interval(self.check_interval)
    }
}
