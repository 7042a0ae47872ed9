//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Login gate, chat feed and the client that ties them together
//! - Rendering: Snapshot to display rows, time formatting
//! - Errors: Domain-specific errors
//! - Messaging: Console input parsing

pub mod errors;
pub mod messaging;
pub mod rendering;
pub mod services;
