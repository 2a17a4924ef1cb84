//! Paths, documents, write batches and change feeds.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Field map of a single document.
pub type Fields = Map<String, Value>;

/// Slash-separated path to a collection, e.g. `admins` or `admins/{uid}/students`.
///
/// A collection path always has an odd number of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Parse a collection path.
    pub fn new(path: impl Into<String>) -> Result<Self, StoreError> {
        let path = path.into();
        let segments: Vec<&str> = path.split('/').collect();

        if segments.iter().any(|s| s.is_empty()) {
            return Err(StoreError::InvalidPath(format!("empty segment in '{}'", path)));
        }
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidPath(format!(
                "'{}' names a document, not a collection",
                path
            )));
        }

        Ok(Self(path))
    }

    /// Path of the subcollection `name` under document `key` of this collection.
    pub fn child(&self, key: &str, name: &str) -> Result<Self, StoreError> {
        validate_key(key)?;
        Self::new(format!("{}/{}/{}", self.0, key, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.0
    }
}

/// Reject document keys that would break path addressing.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.contains('/') {
        return Err(StoreError::InvalidPath(format!("invalid document key '{}'", key)));
    }
    Ok(())
}

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
}

impl Document {
    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// How `put` treats an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Replace the whole document.
    #[default]
    Overwrite,
    /// Merge top-level fields into the existing document, creating it if absent.
    Merge,
}

/// A single operation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create a document; the whole batch fails if it already exists.
    Create {
        collection: CollectionPath,
        key: String,
        fields: Fields,
    },
    /// Write a document with the given mode.
    Set {
        collection: CollectionPath,
        key: String,
        fields: Fields,
        mode: WriteMode,
    },
    /// Add a document under a store-generated key.
    Append {
        collection: CollectionPath,
        fields: Fields,
    },
}

/// Writes committed atomically: either every operation applies or none does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, collection: &CollectionPath, key: &str, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Create {
            collection: collection.clone(),
            key: key.to_string(),
            fields,
        });
        self
    }

    pub fn set(
        &mut self,
        collection: &CollectionPath,
        key: &str,
        fields: Fields,
        mode: WriteMode,
    ) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection: collection.clone(),
            key: key.to_string(),
            fields,
            mode,
        });
        self
    }

    pub fn append(&mut self, collection: &CollectionPath, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Append {
            collection: collection.clone(),
            fields,
        });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Notification that a document in a collection changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: CollectionPath,
    /// Key of the changed document, `None` when events were dropped and the
    /// exact keys are unknown.
    pub key: Option<String>,
}

/// Change feed for one collection. Dropping it cancels the subscription.
pub struct Subscription {
    collection: CollectionPath,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn new(collection: CollectionPath, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
        Self {
            collection,
            receiver,
        }
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Wait for the next change in the watched collection.
    ///
    /// Returns `None` once the store has shut down.
    pub async fn changed(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.collection == self.collection => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => {
                    return Some(ChangeEvent {
                        collection: self.collection.clone(),
                        key: None,
                    })
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
