//! File-backed document store
//!
//! Each collection is a JSON array in `<base>/<collection>.json`. Writes go
//! through a temp file and a rename, so readers never see a torn file.
//! Subscriptions poll the file, which lets separate processes sharing a
//! directory see each other's messages.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::errors::StoreError;
use crate::domain::entities::{Message, NewMessage};
use crate::domain::traits::{
    DocumentStore, ErrorHandler, Query, Snapshot, SnapshotHandler, SubscriptionToken,
};

type WatcherMap = HashMap<SubscriptionToken, JoinHandle<()>>;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// JSON file store with polling subscriptions
pub struct JsonFileStore {
    base_path: PathBuf,
    poll_interval: Duration,
    write_lock: tokio::sync::Mutex<()>,
    watchers: Arc<Mutex<WatcherMap>>,
    next_token: AtomicU64,
}

impl JsonFileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_lock: tokio::sync::Mutex::new(()),
            watchers: Arc::new(Mutex::new(HashMap::new())),
            next_token: AtomicU64::new(1),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub async fn init(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File holding `collection`. Names are restricted to `[A-Za-z0-9_-]`.
    pub fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", collection)))
    }

    pub fn active_subscriptions(&self) -> usize {
        self.lock_watchers().len()
    }

    fn lock_watchers(&self) -> MutexGuard<'_, WatcherMap> {
        lock_map(&self.watchers)
    }
}

fn lock_map(watchers: &Mutex<WatcherMap>) -> MutexGuard<'_, WatcherMap> {
    watchers.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        for (_, handle) in self.lock_watchers().drain() {
            handle.abort();
        }
    }
}

fn map_io(e: std::io::Error, path: &Path) -> StoreError {
    if e.kind() == ErrorKind::PermissionDenied {
        StoreError::PermissionDenied(path.display().to_string())
    } else {
        StoreError::Io(e)
    }
}

/// Read a collection file; a missing or blank file is an empty collection
async fn read_collection(path: &Path) -> Result<Vec<Message>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(map_io(e, path)),
    };
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn write_collection(path: &Path, docs: &[Message]) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(docs)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await.map_err(|e| map_io(e, &tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| map_io(e, path))?;
    Ok(())
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn subscribe(
        &self,
        query: Query,
        on_update: SnapshotHandler,
        on_error: ErrorHandler,
    ) -> Result<SubscriptionToken, StoreError> {
        let path = self.collection_path(&query.collection)?;
        let mut last = query.apply(&read_collection(&path).await?);
        on_update(Snapshot::new(last.clone()));

        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let interval = self.poll_interval;
        let registry = Arc::clone(&self.watchers);

        // Registered under the lock so a failing watcher cannot try to remove
        // itself before it has been inserted.
        let mut watchers = self.lock_watchers();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match read_collection(&path).await {
                    Ok(docs) => {
                        let current = query.apply(&docs);
                        if current != last {
                            last = current.clone();
                            on_update(Snapshot::new(current));
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Watcher {} stopped: {}", token, e);
                        lock_map(&registry).remove(&token);
                        on_error(e);
                        break;
                    }
                }
            }
        });
        watchers.insert(token, handle);
        drop(watchers);

        tracing::debug!("Watching {} as {}", self.base_path.display(), token);
        Ok(token)
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        if let Some(handle) = self.lock_watchers().remove(&token) {
            handle.abort();
            tracing::debug!("Watcher {} stopped", token);
        }
    }

    async fn insert(&self, collection: &str, record: NewMessage) -> Result<Message, StoreError> {
        let path = self.collection_path(collection)?;
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| map_io(e, &self.base_path))?;
        let mut docs = read_collection(&path).await?;
        let message = record.commit(Utc::now());
        docs.push(message.clone());
        write_collection(&path, &docs).await?;

        tracing::debug!("Inserted {} into {}", message.id, path.display());
        Ok(message)
    }
}
