//! Domain layer - Core chat model with no external service dependencies
//!
//! This layer contains:
//! - Entities: Core objects (Account, Session, Message)
//! - Traits: Abstractions for infrastructure (DocumentStore, ChatView)

pub mod entities;
pub mod traits;
