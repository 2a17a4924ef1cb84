//! Team directory: Team ID to administrator mapping.

use crate::error::AccountError;
use crate::records::{collection, TeamId, ADMINS, TEAMS};
use chrono::Utc;
use document_store::{DocumentStore, Fields, StoreError, WriteBatch};
use identity_client::AccountId;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Maps each Team ID to exactly one administrator.
///
/// The binding lives in a `teams/{claim key}` document created with a
/// must-not-exist precondition, so concurrent registrations of the same Team
/// ID fail at commit. Lookups read the claim first and fall back to a limit-1
/// query on `admins.teamId` for administrators recorded without one.
#[derive(Clone)]
pub struct TeamDirectory {
    store: Arc<dyn DocumentStore>,
}

impl TeamDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fail with `Conflict` if an administrator already holds this Team ID.
    #[instrument(skip(self), fields(team_id = %team_id))]
    pub async fn ensure_available(&self, team_id: &TeamId) -> Result<(), AccountError> {
        if self.find_admin(team_id).await?.is_some() {
            warn!("Team ID already taken");
            return Err(AccountError::Conflict(team_id.to_string()));
        }
        Ok(())
    }

    /// Add the claim for `team_id` to a write batch.
    pub fn claim(
        &self,
        batch: &mut WriteBatch,
        team_id: &TeamId,
        admin_id: &AccountId,
    ) -> Result<(), AccountError> {
        let mut fields = Fields::new();
        fields.insert("adminUid".into(), json!(admin_id));
        fields.insert("claimedAt".into(), json!(Utc::now()));

        batch.create(&collection(TEAMS)?, &team_id.claim_key(), fields);
        Ok(())
    }

    /// Register `team_id` for `admin_id` on its own.
    pub async fn register(
        &self,
        team_id: &str,
        admin_id: &AccountId,
    ) -> Result<TeamId, AccountError> {
        let team_id = TeamId::parse(team_id)?;
        self.ensure_available(&team_id).await?;

        let mut batch = WriteBatch::new();
        self.claim(&mut batch, &team_id, admin_id)?;
        self.store
            .commit(batch)
            .await
            .map_err(|e| claim_error(e, &team_id))?;

        info!(team_id = %team_id, admin_id = %admin_id, "Team ID registered");
        Ok(team_id)
    }

    /// Administrator holding `team_id`; `InvalidTeam` if none does.
    pub async fn resolve(&self, team_id: &str) -> Result<AccountId, AccountError> {
        let team_id = TeamId::parse(team_id)?;
        self.resolve_id(&team_id).await
    }

    /// [`resolve`](Self::resolve) for an already validated Team ID.
    #[instrument(skip(self), fields(team_id = %team_id))]
    pub async fn resolve_id(&self, team_id: &TeamId) -> Result<AccountId, AccountError> {
        match self.find_admin(team_id).await? {
            Some(admin_id) => {
                debug!(admin_id = %admin_id, "Resolved Team ID");
                Ok(admin_id)
            }
            None => Err(AccountError::InvalidTeam(team_id.to_string())),
        }
    }

    /// Whether `team_id` is well formed and held by an administrator.
    pub async fn verify(&self, team_id: &str) -> Result<bool, AccountError> {
        let Ok(team_id) = TeamId::parse(team_id) else {
            return Ok(false);
        };
        Ok(self.find_admin(&team_id).await?.is_some())
    }

    async fn find_admin(&self, team_id: &TeamId) -> Result<Option<AccountId>, AccountError> {
        let claim = self
            .store
            .get(&collection(TEAMS)?, &team_id.claim_key())
            .await?;
        if let Some(claim) = claim {
            return match claim.get("adminUid").and_then(Value::as_str) {
                Some(admin_id) => Ok(Some(AccountId::new(admin_id))),
                None => Err(AccountError::Malformed(format!(
                    "team claim {} has no adminUid",
                    team_id
                ))),
            };
        }

        let hits = self
            .store
            .query_eq(
                &collection(ADMINS)?,
                "teamId",
                &Value::String(team_id.to_string()),
                1,
            )
            .await?;

        Ok(hits.into_iter().next().map(|doc| AccountId::new(doc.key)))
    }
}

/// Translate a failed commit that carried a team claim.
pub(crate) fn claim_error(error: StoreError, team_id: &TeamId) -> AccountError {
    match error {
        StoreError::AlreadyExists { ref collection, .. } if collection == TEAMS => {
            warn!(team_id = %team_id, "Team ID claimed concurrently");
            AccountError::Conflict(team_id.to_string())
        }
        other => AccountError::Transient(other),
    }
}
