//! Turns point-in-time live reads into debounced transition events.

mod events;
mod watcher;

pub use events::{TransitionEvent, WatcherState};
pub use watcher::{DEFAULT_CHECK_INTERVAL, TransitionWatcher};
