use async_trait::async_trait;
use tracing::debug;

use super::{DetectionContext, DetectionStrategy, Verdict};
use crate::read::LiveState;

/// Page fragments seen on live rooms. Heuristic: the markup is not a
/// contract, so both false positives and false negatives happen.
pub const DEFAULT_LIVE_KEYWORDS: &[&str] = &[
    r#""is_live":true"#,
    r#""LIVE_NOW""#,
    "webcast_url",
    "LIVE_NOW_BADGE",
];

/// Last-resort strategy: any keyword present means live, otherwise not live.
pub struct KeywordStrategy {
    keywords: Vec<String>,
}

impl KeywordStrategy {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    /// First configured keyword found in `page`.
    pub fn find_match<'a>(&'a self, page: &str) -> Option<&'a str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .find(|kw| !kw.is_empty() && page.contains(*kw))
    }
}

impl Default for KeywordStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_KEYWORDS.iter().map(|s| s.to_string()).collect())
    }
}

#[async_trait]
impl DetectionStrategy for KeywordStrategy {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn detect(&self, ctx: &mut DetectionContext<'_>) -> Verdict {
        match self.find_match(ctx.page) {
            Some(keyword) => {
                debug!(keyword, "Live keyword found in page");
                Verdict::Settled(LiveState::Live)
            }
            None => Verdict::Settled(LiveState::NotLive),
        }
    }
}
