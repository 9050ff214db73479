//! Storage trait definitions

use crate::model::Diagram;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Drawing not found: {0}")]
    DrawingNotFound(String),

    #[error("Invalid persisted graph: {0}")]
    InvalidGraph(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Unique identifier for a drawing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawingId(String);

impl DrawingId {
    /// Create a new random DrawingId
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Create a DrawingId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DrawingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DrawingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Drawing metadata, without its graph content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingMeta {
    pub id: DrawingId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cross-page link between two tagged connector assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLink {
    /// Lexicographically smaller asset id
    pub a: String,
    /// Lexicographically larger asset id
    pub b: String,
    /// The shared tag both assets carry
    pub tag: String,
}

/// Trait for drawing storage backends
///
/// Implementations must be thread-safe (Send + Sync) to support
/// concurrent access from multiple threads.
pub trait AssetStore: Send + Sync {
    // === Drawing Operations ===

    /// List all drawings, oldest first
    fn list_drawings(&self) -> StorageResult<Vec<DrawingMeta>>;

    /// Create a new empty drawing
    fn create_drawing(&self, name: &str) -> StorageResult<DrawingMeta>;

    /// Rename a drawing
    fn rename_drawing(&self, id: &DrawingId, name: &str) -> StorageResult<()>;

    /// Delete a drawing and everything persisted under it
    fn delete_drawing(&self, id: &DrawingId) -> StorageResult<bool>;

    // === Graph Operations ===

    /// Persist a drawing's diagram atomically, replacing its previous
    /// content and refreshing cross-page links.
    fn save_drawing(&self, id: &DrawingId, diagram: &Diagram) -> StorageResult<()>;

    /// Load a drawing's diagram
    fn load_drawing(&self, id: &DrawingId) -> StorageResult<Diagram>;

    /// All cross-page links currently persisted
    fn list_links(&self) -> StorageResult<Vec<AssetLink>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: AssetStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
