//! Wiring between configuration, storage and the platform backends

pub mod config;
pub mod platform;

pub use config::AppConfig;
pub use platform::{Capabilities, Services};

use crate::storage::{FileStore, StorageGateway};
use crate::Result;
use std::sync::Arc;

/// Open the file-backed storage gateway described by `config`
pub fn open_storage(config: &AppConfig) -> Result<StorageGateway> {
    let store = FileStore::open(&config.storage.data_dir)?;
    Ok(StorageGateway::new(Arc::new(store), config.storage.keys()))
}
