//! Account registration for administrators and students.

use crate::backend::Backend;
use crate::directory::{claim_error, TeamDirectory};
use crate::error::AccountError;
use crate::records::{
    admin_child, collection, Account, AdminRecord, Profile, StudentRecord, TeamId,
    ADMINS, STUDENTS, TEAM_STUDENTS, USERS,
};
use chrono::Utc;
use document_store::{WriteBatch, WriteMode};
use identity_client::{AccountCredential, AccountId};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

/// Result of a successful administrator signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRegistration {
    pub account_id: AccountId,
    pub team_id: TeamId,
}

/// Result of a successful student signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRegistration {
    pub account_id: AccountId,
    pub admin_id: AccountId,
    pub team_id: TeamId,
}

/// Creates identity-provider accounts and their directory records.
///
/// Order for both roles: local validation, directory check, credential
/// creation, then one atomic batch with every record. If the batch fails the
/// freshly created credential is deleted again so no orphan account remains.
#[derive(Clone)]
pub struct AccountRegistrar {
    backend: Backend,
    directory: TeamDirectory,
}

impl AccountRegistrar {
    pub fn new(backend: Backend) -> Self {
        let directory = TeamDirectory::new(backend.store.clone());
        Self { backend, directory }
    }

    pub fn directory(&self) -> &TeamDirectory {
        &self.directory
    }

    /// Register an administrator who owns `team_id`.
    #[instrument(skip(self, password, profile))]
    pub async fn register_administrator(
        &self,
        email: &str,
        password: &str,
        team_id: &str,
        profile: Profile,
    ) -> Result<AdminRegistration, AccountError> {
        let team_id = TeamId::parse(team_id)?;
        profile.validate()?;

        self.directory.ensure_available(&team_id).await?;

        let credential = self.backend.identity.create_account(email, password).await?;
        let account_id = credential.account_id.clone();

        let account = Account::Admin(AdminRecord {
            uid: account_id.clone(),
            email: credential.email.clone(),
            team_id: team_id.clone(),
            created_at: Utc::now(),
            profile: profile.into_fields(),
        });
        let fields = account.to_fields()?;

        let mut batch = WriteBatch::new();
        self.directory.claim(&mut batch, &team_id, &account_id)?;
        batch
            .set(&collection(ADMINS)?, account_id.as_str(), fields.clone(), WriteMode::Overwrite)
            .set(&collection(USERS)?, account_id.as_str(), fields, WriteMode::Overwrite);

        if let Err(e) = self.backend.store.commit(batch).await {
            self.discard_credential(&credential).await;
            return Err(claim_error(e, &team_id));
        }

        info!(account_id = %account_id, team_id = %team_id, "Administrator registered");
        Ok(AdminRegistration {
            account_id,
            team_id,
        })
    }

    /// Register a student into the team of the administrator holding `team_id`.
    #[instrument(skip(self, password, profile))]
    pub async fn register_student(
        &self,
        email: &str,
        password: &str,
        team_id: &str,
        profile: Profile,
    ) -> Result<StudentRegistration, AccountError> {
        let team_id = TeamId::parse(team_id)?;
        profile.validate()?;

        // Must precede credential creation: an unknown team leaves nothing behind.
        let admin_id = self.directory.resolve_id(&team_id).await?;

        let credential = self.backend.identity.create_account(email, password).await?;
        let account_id = credential.account_id.clone();
        let joined_at = Utc::now();
        let profile = profile.into_fields();

        let mut membership = profile.clone();
        membership.insert("uid".into(), json!(account_id));
        membership.insert("email".into(), json!(credential.email));
        membership.insert("joinedAt".into(), json!(joined_at));

        let account = Account::Student(StudentRecord {
            uid: account_id.clone(),
            email: credential.email.clone(),
            admin_uid: admin_id.clone(),
            team_id: team_id.clone(),
            joined_at,
            profile,
        });
        let fields = account.to_fields()?;

        let mut batch = WriteBatch::new();
        batch
            .append(&admin_child(&admin_id, TEAM_STUDENTS)?, membership)
            .set(&collection(STUDENTS)?, account_id.as_str(), fields.clone(), WriteMode::Overwrite)
            .set(&collection(USERS)?, account_id.as_str(), fields, WriteMode::Overwrite);

        if let Err(e) = self.backend.store.commit(batch).await {
            self.discard_credential(&credential).await;
            return Err(AccountError::Transient(e));
        }

        info!(
            account_id = %account_id,
            admin_id = %admin_id,
            team_id = %team_id,
            "Student assigned to team"
        );
        Ok(StudentRegistration {
            account_id,
            admin_id,
            team_id,
        })
    }

    /// Best-effort removal of a credential whose records could not be written.
    async fn discard_credential(&self, credential: &AccountCredential) {
        match self.backend.identity.delete_account(credential).await {
            Ok(()) => warn!(
                account_id = %credential.account_id,
                "Record write failed, credential removed"
            ),
            Err(e) => warn!(
                account_id = %credential.account_id,
                error = %e,
                "Record write failed and credential could not be removed"
            ),
        }
    }
}

