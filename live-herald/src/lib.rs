//! live-herald library crate.
//!
//! Watches one live-streaming page and tells every subscriber when the
//! stream starts or ends.
//!
//! - [`subscribers`]: persisted subscriber set
//! - [`monitor`]: the transition watcher turning reads into events
//! - [`notification`]: broadcast dispatcher, delivery channels, message text
//! - [`service`]: the [`Herald`] facade the command layer talks to

pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod panic_hook;
pub mod service;
pub mod signals;
pub mod subscribers;

pub use error::{Error, Result};
pub use service::Herald;
