use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use live_probe::{LiveProbe, LiveState};
use tracing::{debug, error, info};

use super::events::{TransitionEvent, WatcherState};
use crate::notification::{BroadcastDispatcher, MessageTemplates};
use crate::panic_hook::payload_message;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Polls the probe and broadcasts Started/Ended on state edges.
///
/// The last known state lives here and nowhere else. UNKNOWN reads are
/// ignored entirely, and the first definite read only initializes state.
pub struct TransitionWatcher {
    probe: Arc<dyn LiveProbe>,
    dispatcher: Arc<BroadcastDispatcher>,
    templates: MessageTemplates,
    check_interval: Duration,
    state: WatcherState,
}

impl TransitionWatcher {
    pub fn new(
        probe: Arc<dyn LiveProbe>,
        dispatcher: Arc<BroadcastDispatcher>,
        templates: MessageTemplates,
    ) -> Self {
        Self {
            probe,
            dispatcher,
            templates,
            check_interval: DEFAULT_CHECK_INTERVAL,
            state: WatcherState::Uninitialized,
        }
    }

    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Feed one read into the state machine.
    pub fn observe(&mut self, read: LiveState) -> Option<TransitionEvent> {
        if !read.is_definite() {
            return None;
        }

        let (next, event) = match (self.state, read) {
            (WatcherState::Uninitialized, LiveState::Live) => (WatcherState::Live, None),
            (WatcherState::Uninitialized, LiveState::NotLive) => (WatcherState::NotLive, None),
            (WatcherState::NotLive, LiveState::Live) => {
                (WatcherState::Live, Some(TransitionEvent::Started))
            }
            (WatcherState::Live, LiveState::NotLive) => {
                (WatcherState::NotLive, Some(TransitionEvent::Ended))
            }
            (state, _) => (state, None),
        };

        if next != self.state {
            debug!(from = %self.state, to = %next, "Watcher state changed");
        }
        self.state = next;
        event
    }

    /// Priming read. Never emits.
    pub async fn prime(&mut self) {
        let read = self.probe.read().await;
        let _ = self.observe(read.state);
        info!(
            state = %self.state,
            room_id = ?read.room_id,
            source = ?read.source,
            "Watcher primed"
        );
    }

    /// One read-compare-notify cycle.
    pub async fn tick(&mut self) -> Option<TransitionEvent> {
        let read = self.probe.read().await;
        debug!(state = %read.state, room_id = ?read.room_id, source = ?read.source, "Live read");

        let event = self.observe(read.state)?;
        info!(event = %event, room_id = ?read.room_id, "Live transition detected");

        let message = self.templates.transition(event);
        let delivered = self.dispatcher.broadcast_all(&message).await;
        info!(event = %event, delivered, "Transition broadcast");
        Some(event)
    }

    /// Prime, then tick every `check_interval` forever.
    ///
    /// A panicking tick is logged and the loop carries on.
    pub async fn run(mut self) {
        info!(interval = ?self.check_interval, "Transition watcher started");

        if let Err(panic) = AssertUnwindSafe(self.prime()).catch_unwind().await {
            error!(panic = payload_message(&*panic), "Priming read panicked");
        }

        loop {
            tokio::time::sleep(self.check_interval).await;

            if let Err(panic) = AssertUnwindSafe(self.tick()).catch_unwind().await {
                error!(panic = payload_message(&*panic), "Watcher tick panicked, continuing");
            }
        }
    }
}
