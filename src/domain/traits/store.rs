use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::application::errors::StoreError;
use crate::domain::entities::{Message, NewMessage};

/// Receives the full ordered result set on every change
pub type SnapshotHandler = Arc<dyn Fn(Snapshot) + Send + Sync>;

/// Receives a listener failure; the subscription is dead afterwards
pub type ErrorHandler = Arc<dyn Fn(StoreError) + Send + Sync>;

/// Message field a query can order by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageField {
    CreatedAt,
    Username,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: MessageField,
    pub direction: Direction,
}

impl OrderBy {
    pub fn ascending(field: MessageField) -> Self {
        Self {
            field,
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: MessageField) -> Self {
        Self {
            field,
            direction: Direction::Descending,
        }
    }
}

/// A subscribable view over one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    pub order_by: OrderBy,
}

impl Query {
    pub fn new(collection: impl Into<String>, order_by: OrderBy) -> Self {
        Self {
            collection: collection.into(),
            order_by,
        }
    }

    /// Order documents for this query. Stable, so ties keep insertion order.
    pub fn apply(&self, docs: &[Message]) -> Vec<Message> {
        let mut ordered = docs.to_vec();
        ordered.sort_by(|a, b| {
            let ord = match self.order_by.field {
                MessageField::CreatedAt => a.created_at.cmp(&b.created_at),
                MessageField::Username => a.username.cmp(&b.username),
            };
            match self.order_by.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
        ordered
    }
}

/// Complete ordered result of a query at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub messages: Vec<Message>,
}

impl Snapshot {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Handle to an active subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub u64);

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// DocumentStore trait - the remote message store the chat feed talks to
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Build a query over a collection
    fn query(&self, collection: &str, order_by: OrderBy) -> Query {
        Query::new(collection, order_by)
    }

    /// Start listening. The initial snapshot is always delivered.
    async fn subscribe(
        &self,
        query: Query,
        on_update: SnapshotHandler,
        on_error: ErrorHandler,
    ) -> Result<SubscriptionToken, StoreError>;

    /// Stop listening. Unknown or already released tokens are ignored.
    fn unsubscribe(&self, token: SubscriptionToken);

    /// Append a record; the store assigns the id and resolves the timestamp
    async fn insert(&self, collection: &str, record: NewMessage) -> Result<Message, StoreError>;
}
