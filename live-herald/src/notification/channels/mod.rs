//! Delivery channels.
//!
//! A channel pushes one rendered message to one subscriber and reports
//! whether a failure is worth retrying on the next broadcast.

mod telegram;

pub use telegram::{TelegramChannel, TelegramConfig};

use std::fmt;

use async_trait::async_trait;

use crate::subscribers::SubscriberId;

/// Failure to deliver a message to a single recipient.
#[derive(Debug, Clone)]
pub struct DeliveryError {
    pub message: String,
    /// The recipient can never be reached again and should be pruned.
    pub permanent: bool,
}

impl DeliveryError {
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            permanent: true,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            permanent: false,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.permanent { "permanent" } else { "transient" };
        write!(f, "{kind} delivery failure: {}", self.message)
    }
}

impl std::error::Error for DeliveryError {}

/// Trait for delivery channels.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Deliver `text` to `recipient`.
    async fn deliver(&self, recipient: SubscriberId, text: &str) -> Result<(), DeliveryError>;
}
