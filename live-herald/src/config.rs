//! Process configuration from environment variables.
//!
//! Supported env vars:
//! - `TELEGRAM_TOKEN` (required)
//! - `TIKTOK_URL` (required, http/https)
//! - `STREAMER_NAME` (default "The streamer")
//! - `SUBSCRIBERS_FILE` (default "subscribers.json")
//! - `CHECK_INTERVAL_SECS` (default 60)
//! - `SEND_DELAY_MS` (default 50)
//! - `REQUEST_TIMEOUT_SECS` (default 15)
//! - `STATUS_ENDPOINT`, `STATUS_LIVE_VALUES`, `STATUS_ENDED_VALUES`
//! - `LIVE_KEYWORDS` (comma separated)
//! - `LOG_DIR` (default "logs")

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use live_probe::detector::validate_target_url;
use live_probe::strategy::{DEFAULT_LIVE_KEYWORDS, ROOM_ID_PLACEHOLDER};
use live_probe::{DetectorConfig, StatusMapping};

use crate::monitor::DEFAULT_CHECK_INTERVAL;
use crate::notification::{DEFAULT_SEND_DELAY, TelegramConfig};
use crate::{Error, Result};

pub const DEFAULT_STREAMER_NAME: &str = "The streamer";
pub const DEFAULT_SUBSCRIBERS_FILE: &str = "subscribers.json";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Clone)]
pub struct HeraldConfig {
    pub telegram_token: String,
    pub target_url: String,
    pub streamer_name: String,
    pub subscribers_file: PathBuf,
    pub check_interval: Duration,
    pub send_delay: Duration,
    pub request_timeout: Duration,
    pub status: StatusMapping,
    pub keywords: Vec<String>,
    pub log_dir: PathBuf,
}

impl HeraldConfig {
    /// Defaults for everything but the two required values.
    pub fn new(telegram_token: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            telegram_token: telegram_token.into(),
            target_url: target_url.into(),
            streamer_name: DEFAULT_STREAMER_NAME.to_string(),
            subscribers_file: PathBuf::from(DEFAULT_SUBSCRIBERS_FILE),
            check_interval: DEFAULT_CHECK_INTERVAL,
            send_delay: DEFAULT_SEND_DELAY,
            request_timeout: live_probe::client::DEFAULT_REQUEST_TIMEOUT,
            status: StatusMapping::default(),
            keywords: DEFAULT_LIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let telegram_token =
            get("TELEGRAM_TOKEN").ok_or_else(|| Error::config("TELEGRAM_TOKEN is not set"))?;
        let target_url = get("TIKTOK_URL").ok_or_else(|| Error::config("TIKTOK_URL is not set"))?;

        let mut config = Self::new(telegram_token, target_url);

        if let Some(name) = get("STREAMER_NAME") {
            config.streamer_name = name;
        }
        if let Some(path) = get("SUBSCRIBERS_FILE") {
            config.subscribers_file = PathBuf::from(path);
        }
        if let Some(secs) = get("CHECK_INTERVAL_SECS") {
            config.check_interval = Duration::from_secs(parse_number("CHECK_INTERVAL_SECS", &secs)?);
        }
        if let Some(ms) = get("SEND_DELAY_MS") {
            config.send_delay = Duration::from_millis(parse_number("SEND_DELAY_MS", &ms)?);
        }
        if let Some(secs) = get("REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", &secs)?);
        }
        if let Some(endpoint) = get("STATUS_ENDPOINT") {
            config.status.endpoint = endpoint;
        }
        if let Some(values) = get("STATUS_LIVE_VALUES") {
            config.status.live_values = split_list(&values);
        }
        if let Some(values) = get("STATUS_ENDED_VALUES") {
            config.status.ended_values = split_list(&values);
        }
        if let Some(keywords) = get("LIVE_KEYWORDS") {
            config.keywords = split_list(&keywords);
        }
        if let Some(dir) = get("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram_token.is_empty() {
            return Err(Error::config("Telegram token must not be empty"));
        }
        validate_target_url(&self.target_url)
            .map_err(|e| Error::config(format!("TIKTOK_URL is invalid: {e}")))?;
        if self.check_interval.is_zero() {
            return Err(Error::config("Check interval must be at least 1 second"));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config("Request timeout must be at least 1 second"));
        }
        if !self.status.endpoint.contains(ROOM_ID_PLACEHOLDER) {
            return Err(Error::config(format!(
                "STATUS_ENDPOINT must contain {ROOM_ID_PLACEHOLDER}"
            )));
        }
        if self.keywords.is_empty() {
            return Err(Error::config("At least one live keyword is required"));
        }
        Ok(())
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            request_timeout: self.request_timeout,
            status: self.status.clone(),
            keywords: self.keywords.clone(),
            ..DetectorConfig::new(self.target_url.clone())
        }
    }

    pub fn telegram_config(&self) -> TelegramConfig {
        TelegramConfig {
            request_timeout: self.request_timeout,
            ..TelegramConfig::new(self.telegram_token.clone())
        }
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
