//! Backend service clients.

use crate::config::{Config, IdentityBackend};
use crate::error::AccountError;
use anyhow::{Context, Result};
use document_store::{DocumentStore, MemoryDocumentStore};
use identity_client::{FirebaseAuthClient, IdentityProvider, MemoryIdentityProvider};
use std::sync::Arc;
use tracing::info;

/// The identity provider and document store, constructed once at startup and
/// passed to every component.
#[derive(Clone)]
pub struct Backend {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn DocumentStore>,
}

impl Backend {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { identity, store }
    }

    /// In-memory backend without persistence.
    pub fn memory() -> Self {
        Self::new(
            Arc::new(MemoryIdentityProvider::default()),
            Arc::new(MemoryDocumentStore::new()),
        )
    }

    /// Build the backend described by the configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let identity: Arc<dyn IdentityProvider> = match config.identity.backend {
            IdentityBackend::Memory => {
                info!("Using in-memory identity provider");
                Arc::new(MemoryIdentityProvider::new(
                    config.identity.max_failed_attempts,
                ))
            }
            IdentityBackend::Firebase => {
                let api_key = config
                    .identity
                    .api_key
                    .clone()
                    .context("IDENTITY__API_KEY is required for the firebase backend")?;
                info!("Using identity toolkit at {}", config.identity.base_url);
                Arc::new(
                    FirebaseAuthClient::new(&config.identity.base_url, api_key)
                        .context("Failed to create identity toolkit client")?,
                )
            }
        };

        let store = if config.store.persist {
            MemoryDocumentStore::open(&config.store.snapshot_path)
                .await
                .context("Failed to open document snapshot")?
        } else {
            info!("Persistence disabled, using in-memory document store");
            MemoryDocumentStore::new()
        };

        Ok(Self::new(identity, Arc::new(store)))
    }

    /// Flush backend state. Call once at shutdown.
    pub async fn shutdown(&self) -> Result<(), AccountError> {
        self.store.flush().await?;
        info!("Backend shut down");
        Ok(())
    }
}
