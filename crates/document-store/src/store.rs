//! The document store capability.

use crate::error::StoreError;
use crate::types::{CollectionPath, Document, Fields, Subscription, WriteBatch, WriteMode};
use async_trait::async_trait;
use serde_json::Value;

/// Document persistence with query-by-field support.
///
/// Implementations are shared behind `Arc<dyn DocumentStore>`; every method is
/// an independent remote call with no client-side retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by key.
    async fn get(&self, collection: &CollectionPath, key: &str)
        -> Result<Option<Document>, StoreError>;

    /// Write a document.
    async fn put(
        &self,
        collection: &CollectionPath,
        key: &str,
        fields: Fields,
        mode: WriteMode,
    ) -> Result<(), StoreError>;

    /// Documents whose `field` equals `value`, ordered by key, at most `limit`.
    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;

    /// Add a document under a generated key and return the key.
    async fn append(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError>;

    /// Number of documents in a collection.
    async fn count(&self, collection: &CollectionPath) -> Result<usize, StoreError>;

    /// Subscribe to changes in a collection.
    async fn subscribe(&self, collection: &CollectionPath) -> Result<Subscription, StoreError>;

    /// Apply every operation of the batch atomically.
    ///
    /// Returns the key written by each operation, in batch order.
    async fn commit(&self, batch: WriteBatch) -> Result<Vec<String>, StoreError>;

    /// Persist buffered state before shutdown.
    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
