//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Document store backends
//! - Adapters: Front-ends (console)

pub mod adapters;
pub mod config;
pub mod storage;
