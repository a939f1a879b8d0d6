//! Application-wide error types.

use thiserror::Error;

use crate::subscribers::StoreError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Subscriber store error: {0}")]
    Store(#[from] StoreError),

    #[error("Probe error: {0}")]
    Probe(#[from] live_probe::ProbeError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
