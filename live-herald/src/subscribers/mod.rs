//! Persisted set of notification recipients.

mod store;

pub use store::{JsonFileStore, MemoryStore};

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque recipient key (a Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriberId(pub i64);

impl From<i64> for SubscriberId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("subscriber store unavailable at {}: {reason}", .path.display())]
    Unavailable { path: PathBuf, reason: String },

    #[error("failed to persist subscribers to {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Set of subscribers with idempotent mutations.
///
/// Every mutation is persisted before it returns.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn list(&self) -> Result<HashSet<SubscriberId>, StoreError>;

    /// Returns `true` when `id` was not already present.
    async fn add(&self, id: SubscriberId) -> Result<bool, StoreError>;

    /// Returns `true` when `id` was present.
    async fn remove(&self, id: SubscriberId) -> Result<bool, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_id_is_bare_integer() {
        let json = serde_json::to_string(&SubscriberId(-100987)).unwrap();
        assert_eq!(json, "-100987");

        let id: SubscriberId = serde_json::from_str("12345").unwrap();
        assert_eq!(id, SubscriberId(12345));
        assert_eq!(id.to_string(), "12345");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Unavailable {
            path: PathBuf::from("subscribers.json"),
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("subscribers.json"));
        assert!(err.to_string().contains("expected value"));
    }
}
