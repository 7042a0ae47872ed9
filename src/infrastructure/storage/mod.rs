//! Document store implementations

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::domain::traits::DocumentStore;
use crate::infrastructure::config::{StoreBackend, StoreConfig};

/// Build the store selected by the configuration
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, ConfigError> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory message store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::JsonFile => {
            let path = config
                .path
                .clone()
                .ok_or_else(|| ConfigError::MissingField("store.path".to_string()))?;
            tracing::info!("Using JSON file store at {}", path.display());
            Ok(Arc::new(
                JsonFileStore::new(path)
                    .with_poll_interval(Duration::from_millis(config.poll_interval_ms)),
            ))
        }
    }
}
