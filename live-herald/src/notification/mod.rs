//! Notification fan-out.
//!
//! - [`BroadcastDispatcher`] walks the subscriber set and isolates failures
//!   per recipient
//! - [`channels`] holds the transports (Telegram)
//! - [`messages`] renders the text users see

pub mod channels;
mod dispatcher;
pub mod messages;
#[cfg(test)]
pub(crate) mod testing;

pub use channels::{DeliveryChannel, DeliveryError, TelegramChannel, TelegramConfig};
pub use dispatcher::{BroadcastDispatcher, DEFAULT_SEND_DELAY};
pub use messages::MessageTemplates;
