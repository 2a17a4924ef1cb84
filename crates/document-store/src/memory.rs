//! In-memory document store with optional JSON snapshot persistence.

use crate::error::StoreError;
use crate::store::DocumentStore;
use crate::types::{
    validate_key, ChangeEvent, CollectionPath, Document, Fields, Subscription, WriteBatch,
    WriteMode, WriteOp,
};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, instrument};

/// Length of generated document keys.
const AUTO_KEY_LEN: usize = 20;

/// Capacity of the change feed before slow subscribers start lagging.
const CHANGE_FEED_CAPACITY: usize = 256;

/// Snapshot schema version.
const SNAPSHOT_VERSION: u32 = 1;

type Collections = HashMap<CollectionPath, BTreeMap<String, Fields>>;

/// On-disk snapshot layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    collections: BTreeMap<String, BTreeMap<String, Fields>>,
}

/// In-memory document store.
///
/// Cloning is cheap and clones share state. When opened with a snapshot path
/// the contents are loaded on open and written back on [`DocumentStore::flush`].
#[derive(Clone)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
    changes: broadcast::Sender<ChangeEvent>,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    /// Create an empty store without persistence.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            changes,
            snapshot_path: None,
        }
    }

    /// Open a store backed by a snapshot file, loading it if present.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut store = Self::new();

        match fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
                if snapshot.version != SNAPSHOT_VERSION {
                    return Err(StoreError::SnapshotVersion {
                        found: snapshot.version,
                        expected: SNAPSHOT_VERSION,
                    });
                }
                let mut collections = HashMap::new();
                for (name, docs) in snapshot.collections {
                    collections.insert(CollectionPath::new(name)?, docs);
                }
                info!(
                    "Loaded document snapshot from {:?} ({} collections)",
                    path,
                    collections.len()
                );
                store.collections = Arc::new(RwLock::new(collections));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No document snapshot at {:?}, starting empty", path);
            }
            Err(e) => return Err(e.into()),
        }

        store.snapshot_path = Some(path);
        Ok(store)
    }

    /// Path of the snapshot file, if persistence is enabled.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Total number of documents across all collections.
    pub async fn document_count(&self) -> usize {
        self.collections.read().await.values().map(BTreeMap::len).sum()
    }

    fn notify(&self, events: Vec<ChangeEvent>) {
        for event in events {
            // No receivers is fine.
            let _ = self.changes.send(event);
        }
    }
}

fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_KEY_LEN)
        .map(char::from)
        .collect()
}

fn write_fields(docs: &mut BTreeMap<String, Fields>, key: String, fields: Fields, mode: WriteMode) {
    match mode {
        WriteMode::Overwrite => {
            docs.insert(key, fields);
        }
        WriteMode::Merge => {
            let existing = docs.entry(key).or_default();
            for (name, value) in fields {
                existing.insert(name, value);
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    #[instrument(skip(self))]
    async fn get(
        &self,
        collection: &CollectionPath,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        validate_key(key)?;
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .map(|fields| Document {
                key: key.to_string(),
                fields: fields.clone(),
            }))
    }

    #[instrument(skip(self, fields))]
    async fn put(
        &self,
        collection: &CollectionPath,
        key: &str,
        fields: Fields,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        validate_key(key)?;
        {
            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection.clone()).or_default();
            write_fields(docs, key.to_string(), fields, mode);
        }

        debug!("Wrote {}/{}", collection, key);
        self.notify(vec![ChangeEvent {
            collection: collection.clone(),
            key: Some(key.to_string()),
        }]);
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|(_, fields)| fields.get(field) == Some(value))
            .take(limit)
            .map(|(key, fields)| Document {
                key: key.clone(),
                fields: fields.clone(),
            })
            .collect())
    }

    #[instrument(skip(self, fields))]
    async fn append(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        let mut batch = WriteBatch::new();
        batch.append(collection, fields);
        let keys = self.commit(batch).await?;
        keys.into_iter()
            .next()
            .ok_or_else(|| StoreError::Unavailable("append produced no key".into()))
    }

    async fn count(&self, collection: &CollectionPath) -> Result<usize, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(BTreeMap::len).unwrap_or(0))
    }

    async fn subscribe(&self, collection: &CollectionPath) -> Result<Subscription, StoreError> {
        debug!("New subscription on {}", collection);
        Ok(Subscription::new(collection.clone(), self.changes.subscribe()))
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<Vec<String>, StoreError> {
        let ops = batch.into_ops();
        let mut keys = Vec::with_capacity(ops.len());
        let mut events = Vec::with_capacity(ops.len());

        {
            let mut collections = self.collections.write().await;

            // Check every precondition before touching anything.
            let mut created = HashSet::new();
            for op in &ops {
                match op {
                    WriteOp::Create { collection, key, .. } => {
                        validate_key(key)?;
                        let exists = collections
                            .get(collection)
                            .is_some_and(|docs| docs.contains_key(key));
                        if exists || !created.insert((collection, key)) {
                            return Err(StoreError::AlreadyExists {
                                collection: collection.to_string(),
                                key: key.clone(),
                            });
                        }
                    }
                    WriteOp::Set { key, .. } => validate_key(key)?,
                    WriteOp::Append { .. } => {}
                }
            }

            for op in ops {
                let (collection, key, fields, mode) = match op {
                    WriteOp::Create {
                        collection,
                        key,
                        fields,
                    } => (collection, key, fields, WriteMode::Overwrite),
                    WriteOp::Set {
                        collection,
                        key,
                        fields,
                        mode,
                    } => (collection, key, fields, mode),
                    WriteOp::Append { collection, fields } => {
                        let docs = collections.entry(collection.clone()).or_default();
                        let mut key = generate_key();
                        while docs.contains_key(&key) {
                            key = generate_key();
                        }
                        (collection, key, fields, WriteMode::Overwrite)
                    }
                };

                let docs = collections.entry(collection.clone()).or_default();
                write_fields(docs, key.clone(), fields, mode);
                events.push(ChangeEvent {
                    collection,
                    key: Some(key.clone()),
                });
                keys.push(key);
            }
        }

        debug!("Committed batch of {} writes", keys.len());
        self.notify(events);
        Ok(keys)
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let snapshot = {
            let collections = self.collections.read().await;
            Snapshot {
                version: SNAPSHOT_VERSION,
                collections: collections
                    .iter()
                    .map(|(path, docs)| (path.to_string(), docs.clone()))
                    .collect(),
            }
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, path).await?;

        info!("Saved document snapshot to {:?}", path);
        Ok(())
    }
}
