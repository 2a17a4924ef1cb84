//! Profile reads and merge-writes.

use crate::error::AccountError;
use crate::records::{collection, Profile, ADMINS, STUDENTS, USERS};
use crate::roles::RoleResolver;
use chrono::{DateTime, Utc};
use document_store::{DocumentStore, Fields, WriteMode};
use identity_client::AccountId;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    roles: RoleResolver,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let roles = RoleResolver::new(store.clone());
        Self { store, roles }
    }

    /// Raw profile fields for an account, or `None` if no record exists.
    ///
    /// A unified record with a `joinedAt` timestamp gets a derived
    /// `startDate` (`YYYY-MM-DD`). Role-table fallbacks are returned as stored.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_profile(&self, account_id: &AccountId) -> Result<Option<Fields>, AccountError> {
        let key = account_id.as_str();

        for table in [USERS, ADMINS, STUDENTS] {
            if let Some(doc) = self.store.get(&collection(table)?, key).await? {
                let mut fields = doc.fields;
                if table == USERS {
                    if let Some(start) = start_date(fields.get("joinedAt")) {
                        fields.insert("startDate".into(), Value::String(start));
                    }
                }
                return Ok(Some(fields));
            }
        }

        Ok(None)
    }

    /// Merge profile fields into the unified record and stamp `updatedAt`.
    #[instrument(skip(self, profile), fields(account_id = %account_id))]
    pub async fn save_profile(
        &self,
        account_id: &AccountId,
        profile: Profile,
    ) -> Result<(), AccountError> {
        profile.validate()?;
        // Merge-writing onto an unknown key would create a record with no role.
        self.roles.resolve_role(account_id).await?;

        let mut fields = profile.into_fields();
        fields.insert("updatedAt".into(), json!(Utc::now()));

        self.store
            .put(&collection(USERS)?, account_id.as_str(), fields, WriteMode::Merge)
            .await?;

        info!("Profile saved");
        Ok(())
    }
}

fn start_date(joined_at: Option<&Value>) -> Option<String> {
    let raw = joined_at?.as_str()?;
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(parsed.with_timezone(&Utc).format("%Y-%m-%d").to_string())
}
