use chrono::Local;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::application::errors::{FeedError, StoreError};
use crate::application::rendering::render_snapshot;
use crate::domain::entities::{Message, NewMessage, Session};
use crate::domain::traits::{
    ChatView, DocumentStore, ErrorHandler, MessageField, OrderBy, Snapshot, SnapshotHandler,
    SubscriptionToken,
};

/// Collection the feed reads and writes unless configured otherwise
pub const DEFAULT_COLLECTION: &str = "messages";

/// Replaces the feed when the listener fails
pub const FEED_ERROR_NOTICE: &str = "Could not load messages. Check the store configuration.";

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// One attempt, no retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::from_millis(250),
        }
    }

    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay after the `attempt`-th failure (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(1u32 << exp)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Where the feed lives and how sends behave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    pub collection: String,
    pub send_retry: RetryPolicy,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            send_retry: RetryPolicy::none(),
        }
    }
}

/// Live message feed for one signed-in session
///
/// Every snapshot from the store replaces the whole rendered list, so sends
/// racing with updates never need merging.
pub struct ChatFeed<S: DocumentStore + ?Sized, V: ChatView + ?Sized> {
    store: Arc<S>,
    view: Arc<V>,
    session: Session,
    settings: FeedSettings,
    // Shared with the error handler, which clears it when the listener dies
    subscription: Arc<Mutex<Option<SubscriptionToken>>>,
}

impl<S: DocumentStore + ?Sized, V: ChatView + ?Sized> ChatFeed<S, V> {
    pub fn new(store: Arc<S>, view: Arc<V>, session: Session, settings: FeedSettings) -> Self {
        Self {
            store,
            view,
            session,
            settings,
            subscription: Arc::new(Mutex::new(None)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    pub fn is_subscribed(&self) -> bool {
        self.lock_subscription().is_some()
    }

    /// Release the listener if one is active. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        let token = self.lock_subscription().take();
        if let Some(token) = token {
            self.store.unsubscribe(token);
            tracing::debug!("Released subscription {}", token);
        }
    }

    fn lock_subscription(&self) -> MutexGuard<'_, Option<SubscriptionToken>> {
        lock_slot(&self.subscription)
    }
}

fn lock_slot(slot: &Mutex<Option<SubscriptionToken>>) -> MutexGuard<'_, Option<SubscriptionToken>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S, V> ChatFeed<S, V>
where
    S: DocumentStore + ?Sized + 'static,
    V: ChatView + ?Sized + 'static,
{
    /// Listen to the collection ordered by creation time, oldest first
    pub async fn subscribe(&self) -> Result<(), FeedError> {
        self.unsubscribe();

        let query = self.store.query(
            &self.settings.collection,
            OrderBy::ascending(MessageField::CreatedAt),
        );

        let on_update: SnapshotHandler = {
            let view = Arc::clone(&self.view);
            let session = self.session.clone();
            Arc::new(move |snapshot: Snapshot| {
                let rows = render_snapshot(&snapshot, &session, &Local::now());
                tracing::debug!("Rendering {} messages", rows.len());
                view.render_feed(&rows);
                view.scroll_to_bottom();
            })
        };

        let on_error: ErrorHandler = {
            let view = Arc::clone(&self.view);
            let slot = Arc::clone(&self.subscription);
            Arc::new(move |e: StoreError| {
                // The store has already dropped a failed listener
                if let Some(token) = lock_slot(&slot).take() {
                    tracing::error!("Message listener {} failed: {}", token, e);
                } else {
                    tracing::error!("Message listener error: {}", e);
                }
                view.show_feed_error(FEED_ERROR_NOTICE);
            })
        };

        match self.store.subscribe(query, on_update, on_error).await {
            Ok(token) => {
                let previous = self.lock_subscription().replace(token);
                if let Some(previous) = previous {
                    self.store.unsubscribe(previous);
                }
                tracing::info!("Subscribed to '{}' ({})", self.settings.collection, token);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to subscribe to '{}': {}", self.settings.collection, e);
                self.view.show_feed_error(FEED_ERROR_NOTICE);
                Err(FeedError::Subscription(e))
            }
        }
    }

    /// Post `text` as the session user.
    ///
    /// Returns `None` when nothing was sent (blank text or no session). The
    /// returned task logs failures and never surfaces them to the view.
    pub fn send(&self, text: &str) -> Option<JoinHandle<()>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let Some(username) = self.session.username() else {
            tracing::warn!("Dropping message sent without a session");
            return None;
        };

        self.view.clear_input();

        let record = NewMessage::new(text, username);
        let store = Arc::clone(&self.store);
        let view = Arc::clone(&self.view);
        let collection = self.settings.collection.clone();
        let retry = self.settings.send_retry;

        Some(tokio::spawn(async move {
            match insert_with_retry(store.as_ref(), &collection, record, retry).await {
                Ok(message) => {
                    tracing::debug!("Message {} committed", message.id);
                    view.scroll_to_bottom();
                }
                Err(e) => tracing::error!("Error sending message: {}", e),
            }
        }))
    }
}

/// Send tasks still in flight, so a caller can let them land before exiting
#[derive(Default)]
pub struct PendingSends {
    tasks: Vec<JoinHandle<()>>,
}

impl PendingSends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a send; finished tasks are pruned as new ones arrive
    pub fn push(&mut self, task: Option<JoinHandle<()>>) {
        self.tasks.retain(|t| !t.is_finished());
        if let Some(task) = task {
            self.tasks.push(task);
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every tracked send to finish
    pub async fn wait_all(self) {
        if !self.tasks.is_empty() {
            tracing::debug!("Waiting for {} pending sends", self.tasks.len());
        }
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("Send task failed: {}", e);
            }
        }
    }
}

impl<S: DocumentStore + ?Sized, V: ChatView + ?Sized> Drop for ChatFeed<S, V> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

async fn insert_with_retry<S: DocumentStore + ?Sized>(
    store: &S,
    collection: &str,
    record: NewMessage,
    retry: RetryPolicy,
) -> Result<Message, FeedError> {
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match store.insert(collection, record.clone()).await {
            Ok(message) => return Ok(message),
            Err(e) if attempt < max_attempts => {
                let delay = retry.delay_for(attempt);
                tracing::warn!(
                    "Send attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(FeedError::Send(e)),
        }
    }
}
