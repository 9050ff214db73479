//! Persistence: mapping diagrams to a property graph and back

pub mod mapper;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    AssetLink, AssetStore, DrawingId, DrawingMeta, OpenStore, StorageError, StorageResult,
};
