//! Domain traits - Abstractions for infrastructure implementations

pub mod store;
pub mod view;

pub use store::{
    Direction, DocumentStore, ErrorHandler, MessageField, OrderBy, Query, Snapshot,
    SnapshotHandler, SubscriptionToken,
};
pub use view::ChatView;
