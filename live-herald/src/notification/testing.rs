//! Delivery channel fake shared by the unit tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::channels::{DeliveryChannel, DeliveryError};
use crate::subscribers::SubscriberId;

/// Records every attempt and fails for the configured recipients.
#[derive(Default)]
pub struct RecordingChannel {
    permanent: HashSet<SubscriberId>,
    transient: HashSet<SubscriberId>,
    attempts: Mutex<Vec<(SubscriberId, String)>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_permanently(mut self, id: SubscriberId) -> Self {
        self.permanent.insert(id);
        self
    }

    pub fn fail_transiently(mut self, id: SubscriberId) -> Self {
        self.transient.insert(id);
        self
    }

    pub fn recipients(&self) -> Vec<SubscriberId> {
        self.attempts.lock().iter().map(|(id, _)| *id).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.attempts.lock().iter().map(|(_, m)| m.clone()).collect()
    }
}

#[async_trait]
impl DeliveryChannel for RecordingChannel {
    fn channel_type(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, recipient: SubscriberId, text: &str) -> Result<(), DeliveryError> {
        self.attempts.lock().push((recipient, text.to_string()));
        if self.permanent.contains(&recipient) {
            return Err(DeliveryError::permanent("Forbidden: bot was blocked by the user"));
        }
        if self.transient.contains(&recipient) {
            return Err(DeliveryError::transient("timed out"));
        }
        Ok(())
    }
}
