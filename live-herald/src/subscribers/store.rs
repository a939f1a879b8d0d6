use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{StoreError, SubscriberId, SubscriberStore};

/// Subscriber set stored as a JSON array of ids.
///
/// The whole set is rewritten on each mutation through a sibling temp file
/// and a rename, so readers never see a half-written file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashSet<SubscriberId>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Subscriber file missing, starting empty");
                return Ok(HashSet::new());
            }
            Err(e) => return Err(self.unavailable(e)),
        };

        if raw.trim().is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<SubscriberId> = serde_json::from_str(&raw).map_err(|e| self.unavailable(e))?;
        Ok(ids.into_iter().collect())
    }

    async fn persist(&self, ids: &HashSet<SubscriberId>) -> Result<(), StoreError> {
        let mut sorted: Vec<SubscriberId> = ids.iter().copied().collect();
        sorted.sort_unstable();

        let json = serde_json::to_vec(&sorted).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e.into(),
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &json)
            .await
            .map_err(|e| self.write_error(e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.write_error(e))?;

        debug!(path = %self.path.display(), count = sorted.len(), "Persisted subscribers");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn unavailable(&self, reason: impl ToString) -> StoreError {
        StoreError::Unavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SubscriberStore for JsonFileStore {
    async fn list(&self) -> Result<HashSet<SubscriberId>, StoreError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn add(&self, id: SubscriberId) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut ids = self.load().await?;
        if !ids.insert(id) {
            return Ok(false);
        }
        self.persist(&ids).await?;
        info!(subscriber = %id, total = ids.len(), "Subscriber added");
        Ok(true)
    }

    async fn remove(&self, id: SubscriberId) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut ids = self.load().await?;
        if !ids.remove(&id) {
            return Ok(false);
        }
        self.persist(&ids).await?;
        info!(subscriber = %id, total = ids.len(), "Subscriber removed");
        Ok(true)
    }
}

/// In-memory store for embedding and tests.
#[derive(Default)]
pub struct MemoryStore {
    ids: Mutex<HashSet<SubscriberId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribers(ids: impl IntoIterator<Item = SubscriberId>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().collect()),
        }
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn list(&self) -> Result<HashSet<SubscriberId>, StoreError> {
        Ok(self.ids.lock().await.clone())
    }

    async fn add(&self, id: SubscriberId) -> Result<bool, StoreError> {
        Ok(self.ids.lock().await.insert(id))
    }

    async fn remove(&self, id: SubscriberId) -> Result<bool, StoreError> {
        Ok(self.ids.lock().await.remove(&id))
    }
}
