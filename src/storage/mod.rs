pub mod backend;
pub mod gateway;
pub mod types;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use gateway::{StorageGateway, StorageKeys};
pub use types::{Question, Recording, RecordingGroup};
