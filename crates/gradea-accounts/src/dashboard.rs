//! Administrator dashboard: team size and live updates.

use crate::error::AccountError;
use crate::records::{admin_child, TEAM_STUDENTS};
use document_store::{CollectionPath, DocumentStore};
use identity_client::AccountId;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct TeamDashboard {
    store: Arc<dyn DocumentStore>,
}

impl TeamDashboard {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Number of students in the administrator's team.
    #[instrument(skip(self), fields(admin_id = %admin_id))]
    pub async fn student_count(&self, admin_id: &AccountId) -> Result<usize, AccountError> {
        Ok(self
            .store
            .count(&admin_child(admin_id, TEAM_STUDENTS)?)
            .await?)
    }

    /// Call `on_change` with the current student count now and after every
    /// change to the team.
    ///
    /// The subscription lives until the returned handle is cancelled or dropped.
    pub async fn watch_student_count<F>(
        &self,
        admin_id: &AccountId,
        on_change: F,
    ) -> Result<CountWatch, AccountError>
    where
        F: Fn(usize) + Send + 'static,
    {
        let path = admin_child(admin_id, TEAM_STUDENTS)?;
        // Subscribe before the first count so no change slips between them.
        let mut subscription = self.store.subscribe(&path).await?;
        let store = self.store.clone();

        let handle = tokio::spawn(async move {
            if let Some(count) = current_count(&store, &path).await {
                on_change(count);
            }
            while subscription.changed().await.is_some() {
                if let Some(count) = current_count(&store, &path).await {
                    on_change(count);
                }
            }
            debug!("Student count feed closed for {}", path);
        });

        Ok(CountWatch { handle })
    }
}

async fn current_count(store: &Arc<dyn DocumentStore>, path: &CollectionPath) -> Option<usize> {
    match store.count(path).await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!("Failed to count {}: {}", path, e);
            None
        }
    }
}

/// Handle for a live student-count subscription.
#[derive(Debug)]
pub struct CountWatch {
    handle: JoinHandle<()>,
}

impl CountWatch {
    /// Stop delivering updates.
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
