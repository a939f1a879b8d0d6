//! HTTP client construction.
//!
//! The upstream varies content by client signature, so every request carries
//! a desktop browser user agent and an explicit locale.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use crate::error::ProbeError;

pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Default per-request timeout. Bounds a hung fetch so the poll cadence holds.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate may have installed one first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// A `ClientBuilder` with the browser-like default headers applied.
pub fn create_client_builder(request_timeout: Duration) -> ClientBuilder {
    install_rustls_provider();

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
    );

    let mut builder = Client::builder()
        .user_agent(DEFAULT_UA)
        .default_headers(headers);

    if request_timeout > Duration::ZERO {
        builder = builder.timeout(request_timeout);
    }

    builder
}

pub fn build_client(request_timeout: Duration) -> Result<Client, ProbeError> {
    create_client_builder(request_timeout)
        .build()
        .map_err(ProbeError::from)
}
