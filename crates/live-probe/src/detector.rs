//! Live state detector.
//!
//! Fetches the target page once per read and runs the strategy chain over it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::cache::RoomIdCache;
use crate::client;
use crate::error::ProbeError;
use crate::read::LiveRead;
use crate::strategy::{
    DEFAULT_LIVE_KEYWORDS, DetectionContext, DetectionStrategy, KeywordStrategy, RoomIdStrategy,
    StatusMapping, StatusQueryStrategy, Verdict,
};

/// Source of live reads. The watcher and the command layer only see this.
#[async_trait]
pub trait LiveProbe: Send + Sync {
    /// Produce a fresh read. Never fails; the worst case is `Unknown`.
    async fn read(&self) -> LiveRead;
}

/// Detector configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Page of the followed stream.
    pub target_url: String,
    /// Per-request timeout for the page fetch and the status query.
    pub request_timeout: Duration,
    /// Status endpoint and value mapping.
    pub status: StatusMapping,
    /// Keywords for the last-resort page scan.
    pub keywords: Vec<String>,
}

impl DetectorConfig {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            request_timeout: client::DEFAULT_REQUEST_TIMEOUT,
            status: StatusMapping::default(),
            keywords: DEFAULT_LIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Check that `target` is an absolute http(s) URL.
pub fn validate_target_url(target: &str) -> Result<(), ProbeError> {
    let parsed = url::Url::parse(target).map_err(|e| ProbeError::InvalidUrl(format!("{target}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ProbeError::InvalidUrl(format!(
            "{target}: unsupported scheme {scheme}"
        ))),
    }
}

pub struct LiveDetector {
    client: Client,
    target_url: String,
    strategies: Vec<Box<dyn DetectionStrategy>>,
}

impl LiveDetector {
    /// Build a detector with its own client and the process-wide room id cache.
    pub fn new(config: DetectorConfig) -> Result<Self, ProbeError> {
        let client = client::build_client(config.request_timeout)?;
        Self::with_client(client, config, RoomIdCache::global())
    }

    /// Build a detector with the default strategy chain on a caller-supplied client.
    pub fn with_client(
        client: Client,
        config: DetectorConfig,
        cache: Arc<RoomIdCache>,
    ) -> Result<Self, ProbeError> {
        validate_target_url(&config.target_url)?;

        let strategies: Vec<Box<dyn DetectionStrategy>> = vec![
            Box::new(RoomIdStrategy::new(cache)),
            Box::new(StatusQueryStrategy::new(config.status)),
            Box::new(KeywordStrategy::new(config.keywords)),
        ];

        Ok(Self::with_strategies(client, config.target_url, strategies))
    }

    /// Build a detector with an explicit strategy chain, run in order.
    pub fn with_strategies(
        client: Client,
        target_url: String,
        strategies: Vec<Box<dyn DetectionStrategy>>,
    ) -> Self {
        Self {
            client,
            target_url,
            strategies,
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    async fn fetch_page(&self) -> Result<String, ProbeError> {
        let response = self.client.get(&self.target_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus {
                status: status.as_u16(),
                url: self.target_url.clone(),
            });
        }

        Ok(response.text().await?)
    }

    /// Run one read: fetch, then walk the strategies until one settles.
    pub async fn detect(&self) -> LiveRead {
        let page = match self.fetch_page().await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %self.target_url, error = %e, "Failed to fetch target page");
                return LiveRead::unknown(None);
            }
        };

        let mut ctx = DetectionContext::new(&page, &self.client);

        for strategy in &self.strategies {
            match strategy.detect(&mut ctx).await {
                Verdict::Settled(state) => {
                    debug!(
                        strategy = strategy.name(),
                        %state,
                        room_id = ?ctx.room_id,
                        "Live state settled"
                    );
                    return LiveRead::new(state, ctx.room_id, strategy.name());
                }
                Verdict::Defer => continue,
                Verdict::Abort(e) => {
                    warn!(
                        strategy = strategy.name(),
                        transport = e.is_transport(),
                        error = %e,
                        "Detection aborted"
                    );
                    return LiveRead::unknown(ctx.room_id);
                }
            }
        }

        debug!("No strategy settled the live state");
        LiveRead::unknown(ctx.room_id)
    }
}

#[async_trait]
impl LiveProbe for LiveDetector {
    async fn read(&self) -> LiveRead {
        self.detect().await
    }
}
