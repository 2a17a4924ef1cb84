//! Role resolution.

use crate::error::AccountError;
use crate::records::{collection, Account, Role, ADMINS, STUDENTS, USERS};
use document_store::DocumentStore;
use identity_client::AccountId;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Answers "is this account an administrator or a student?".
///
/// Reads the unified record first and falls back to the role tables. No
/// caching: up to three sequential lookups per call.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn DocumentStore>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn resolve_role(&self, account_id: &AccountId) -> Result<Account, AccountError> {
        self.lookup(account_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("account {}", account_id)))
    }

    /// Like [`resolve_role`](Self::resolve_role) but a miss is `None`.
    pub async fn lookup(&self, account_id: &AccountId) -> Result<Option<Account>, AccountError> {
        let key = account_id.as_str();

        if let Some(doc) = self.store.get(&collection(USERS)?, key).await? {
            return Account::from_fields(doc.fields).map(Some);
        }

        if let Some(doc) = self.store.get(&collection(ADMINS)?, key).await? {
            debug!("Resolved from admins table");
            return Account::from_role_fields(Role::Admin, doc.fields).map(Some);
        }

        if let Some(doc) = self.store.get(&collection(STUDENTS)?, key).await? {
            debug!("Resolved from students table");
            return Account::from_role_fields(Role::Student, doc.fields).map(Some);
        }

        Ok(None)
    }
}
