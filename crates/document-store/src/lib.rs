//! Document store capability for the GradeA account backend.
//!
//! The backend consumes a hosted document database; this crate defines the
//! operations it relies on ([`DocumentStore`]) and ships an in-memory
//! implementation used for tests and single-node deployments. Multi-document
//! writes go through [`WriteBatch`] and are applied atomically.

mod error;
mod memory;
mod store;
mod types;

pub use error::StoreError;
pub use memory::MemoryDocumentStore;
pub use store::DocumentStore;
pub use types::*;
