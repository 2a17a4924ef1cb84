//! Document store errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document already exists: {collection}/{key}")]
    AlreadyExists { collection: String, key: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported snapshot version {found}, expected {expected}")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
