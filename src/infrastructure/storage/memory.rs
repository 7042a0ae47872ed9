//! In-process document store with realtime listeners

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::RwLock;

use crate::application::errors::StoreError;
use crate::domain::entities::{Message, NewMessage};
use crate::domain::traits::{
    DocumentStore, ErrorHandler, Query, Snapshot, SnapshotHandler, SubscriptionToken,
};

#[derive(Clone)]
struct Listener {
    query: Query,
    on_update: SnapshotHandler,
    on_error: ErrorHandler,
}

/// Memory-backed store. Listeners are notified while the collection lock is
/// held, so snapshots reach every listener in commit order.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Message>>>,
    listeners: Mutex<HashMap<SubscriptionToken, Listener>>,
    next_token: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Number of active listeners across all collections
    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    /// Documents of a collection in insertion order
    pub async fn documents(&self, collection: &str) -> Vec<Message> {
        let collections = self.collections.read().await;
        collections.get(collection).cloned().unwrap_or_default()
    }

    /// Fail every listener with `reason` and drop them
    pub fn revoke_listeners(&self, reason: &str) {
        let revoked: Vec<Listener> = self.lock_listeners().drain().map(|(_, l)| l).collect();
        tracing::warn!("Revoking {} listeners: {}", revoked.len(), reason);
        for listener in revoked {
            (listener.on_error)(StoreError::Listener(reason.to_string()));
        }
    }

    fn listeners_for(&self, collection: &str) -> Vec<Listener> {
        self.lock_listeners()
            .values()
            .filter(|l| l.query.collection == collection)
            .cloned()
            .collect()
    }

    fn lock_listeners(&self) -> MutexGuard<'_, HashMap<SubscriptionToken, Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(
        &self,
        query: Query,
        on_update: SnapshotHandler,
        on_error: ErrorHandler,
    ) -> Result<SubscriptionToken, StoreError> {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));

        // Hold the read lock until the initial snapshot is out so no insert
        // can slip in between registration and delivery.
        let collections = self.collections.read().await;
        let docs = collections
            .get(&query.collection)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let snapshot = Snapshot::new(query.apply(docs));

        self.lock_listeners().insert(
            token,
            Listener {
                query,
                on_update: on_update.clone(),
                on_error,
            },
        );
        tracing::debug!("Listener {} registered", token);

        on_update(snapshot);
        Ok(token)
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        if self.lock_listeners().remove(&token).is_some() {
            tracing::debug!("Listener {} removed", token);
        }
    }

    async fn insert(&self, collection: &str, record: NewMessage) -> Result<Message, StoreError> {
        let message = record.commit(Utc::now());

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        docs.push(message.clone());
        tracing::debug!("Inserted {} into '{}' ({} docs)", message.id, collection, docs.len());

        for listener in self.listeners_for(collection) {
            (listener.on_update)(Snapshot::new(listener.query.apply(docs)));
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::{MessageField, OrderBy};
    use std::sync::Arc;

    fn collect_into(sink: Arc<Mutex<Vec<Snapshot>>>) -> SnapshotHandler {
        Arc::new(move |snapshot: Snapshot| sink.lock().unwrap().push(snapshot))
    }

    fn ignore_errors() -> ErrorHandler {
        Arc::new(|_: StoreError| {})
    }

    fn texts(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.iter().map(|m| m.text.as_str()).collect()
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_delivered() {
        let store = MemoryStore::new();
        store.insert("messages", NewMessage::new("first", "Alice")).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let query = store.query("messages", OrderBy::ascending(MessageField::CreatedAt));
        store.subscribe(query, collect_into(seen.clone()), ignore_errors()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(texts(&seen[0]), vec!["first"]);
    }

    #[tokio::test]
    async fn test_insert_notifies_listeners_of_that_collection() {
        let store = MemoryStore::new();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let other = Arc::new(Mutex::new(Vec::new()));
        let by_time = OrderBy::ascending(MessageField::CreatedAt);
        store
            .subscribe(store.query("messages", by_time), collect_into(messages.clone()), ignore_errors())
            .await
            .unwrap();
        store
            .subscribe(store.query("other", by_time), collect_into(other.clone()), ignore_errors())
            .await
            .unwrap();

        store.insert("messages", NewMessage::new("a", "Alice")).await.unwrap();
        store.insert("messages", NewMessage::new("b", "Bob")).await.unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(texts(&messages[2]), vec!["a", "b"]);
        assert_eq!(other.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_descending_query() {
        let store = MemoryStore::new();
        store.insert("messages", NewMessage::new("a", "Alice")).await.unwrap();
        store.insert("messages", NewMessage::new("b", "Bob")).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let query = store.query("messages", OrderBy::descending(MessageField::Username));
        store.subscribe(query, collect_into(seen.clone()), ignore_errors()).await.unwrap();

        assert_eq!(texts(&seen.lock().unwrap()[0]), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_updates() {
        let store = MemoryStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let query = store.query("messages", OrderBy::ascending(MessageField::CreatedAt));
        let token = store.subscribe(query, collect_into(seen.clone()), ignore_errors()).await.unwrap();

        store.unsubscribe(token);
        store.unsubscribe(token);
        store.insert("messages", NewMessage::new("late", "Bob")).await.unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_revoke_reports_errors() {
        let store = MemoryStore::new();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let on_error: ErrorHandler = Arc::new(move |e: StoreError| sink.lock().unwrap().push(e.to_string()));
        let query = store.query("messages", OrderBy::ascending(MessageField::CreatedAt));
        store.subscribe(query, Arc::new(|_: Snapshot| {}), on_error).await.unwrap();

        store.revoke_listeners("denied");

        assert_eq!(*errors.lock().unwrap(), vec!["Listener error: denied".to_string()]);
        assert_eq!(store.listener_count(), 0);
    }
}
