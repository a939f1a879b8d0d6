//! Pluggable detection strategies.
//!
//! A detector runs its strategies in order over one fetched page. Each one
//! either settles the state, defers to the next strategy, or aborts the read.
//! New signals are added by implementing [`DetectionStrategy`] and slotting it
//! into the chain; the watcher never sees the difference.

mod keyword;
mod room_id;
mod status;

pub use keyword::{DEFAULT_LIVE_KEYWORDS, KeywordStrategy};
pub use room_id::{RoomIdStrategy, extract_room_id};
pub use status::{ROOM_ID_PLACEHOLDER, StatusMapping, StatusQueryStrategy};

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ProbeError;
use crate::read::LiveState;

/// Shared state handed down the strategy chain for one read.
pub struct DetectionContext<'a> {
    /// The fetched target page.
    pub page: &'a str,
    /// Client with the browser-like default headers.
    pub client: &'a Client,
    /// Room id found so far (fresh or cached). Filled by [`RoomIdStrategy`].
    pub room_id: Option<String>,
}

impl<'a> DetectionContext<'a> {
    pub fn new(page: &'a str, client: &'a Client) -> Self {
        Self {
            page,
            client,
            room_id: None,
        }
    }
}

/// Outcome of a single strategy.
#[derive(Debug)]
pub enum Verdict {
    /// The strategy is confident about the state.
    Settled(LiveState),
    /// No confident answer; let the next strategy try.
    Defer,
    /// Stop the chain; the read becomes `Unknown`.
    Abort(ProbeError),
}

#[async_trait]
pub trait DetectionStrategy: Send + Sync {
    /// Short name used in logs and [`crate::LiveRead::source`].
    fn name(&self) -> &'static str;

    async fn detect(&self, ctx: &mut DetectionContext<'_>) -> Verdict;
}
