//! Live status detection for a single third-party streaming page.
//!
//! The upstream page has no stable API, so a read walks an ordered chain of
//! [`DetectionStrategy`] objects over the fetched document:
//!
//! 1. [`RoomIdStrategy`] pulls the room id out of the page (or the process-wide
//!    [`RoomIdCache`] when the page omits it).
//! 2. [`StatusQueryStrategy`] asks the room status endpoint about that id.
//! 3. [`KeywordStrategy`] scans the page for markers that correlate with a
//!    live session.
//!
//! A read never fails: every error collapses into [`LiveState::Unknown`].
//!
//! # Example
//!
//! ```ignore
//! use live_probe::{DetectorConfig, LiveDetector, LiveProbe};
//!
//! let detector = LiveDetector::new(DetectorConfig::new("https://www.tiktok.com/@someone/live"))?;
//! let read = detector.read().await;
//! println!("{} (room {:?})", read.state, read.room_id);
//! ```

pub mod cache;
pub mod client;
pub mod detector;
pub mod error;
pub mod read;
pub mod strategy;
mod utils;

pub use cache::RoomIdCache;
pub use detector::{DetectorConfig, LiveDetector, LiveProbe};
pub use error::ProbeError;
pub use read::{LiveRead, LiveState};
pub use strategy::{
    DetectionContext, DetectionStrategy, KeywordStrategy, RoomIdStrategy, StatusMapping,
    StatusQueryStrategy, Verdict,
};
