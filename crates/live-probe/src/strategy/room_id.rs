use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{DetectionContext, DetectionStrategy, Verdict};
use crate::cache::RoomIdCache;
use crate::utils::capture_group_1;

// Key spellings the page has used for the room id over time.
static ROOM_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""roomId"\s*:\s*"(\d+)""#,
        r#""room_id"\s*:\s*"?(\d+)"#,
        r#""roomID"\s*:\s*"?(\d+)"#,
        r#""room_id_str"\s*:\s*"(\d+)""#,
        r#"(?:[?&]|&amp;|\\u0026)room_id=(\d+)"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// First room id any pattern finds in `page`. All-zero ids count as absent.
pub fn extract_room_id(page: &str) -> Option<&str> {
    ROOM_ID_PATTERNS
        .iter()
        .filter_map(|re| capture_group_1(re, page))
        .find(|id| id.bytes().any(|b| b != b'0'))
}

/// Fills [`DetectionContext::room_id`] from the page or, failing that, from
/// the cache. Never settles the state itself.
pub struct RoomIdStrategy {
    cache: Arc<RoomIdCache>,
}

impl RoomIdStrategy {
    pub fn new(cache: Arc<RoomIdCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl DetectionStrategy for RoomIdStrategy {
    fn name(&self) -> &'static str {
        "room_id"
    }

    async fn detect(&self, ctx: &mut DetectionContext<'_>) -> Verdict {
        if let Some(room_id) = extract_room_id(ctx.page) {
            debug!(room_id, "Extracted room id from page");
            self.cache.store(room_id);
            ctx.room_id = Some(room_id.to_string());
        } else if let Some(cached) = self.cache.get() {
            debug!(room_id = %cached, "Page has no room id, using cached hint");
            ctx.room_id = Some(cached);
        } else {
            debug!("No room id in page and none cached");
        }
        Verdict::Defer
    }
}
