//! The identity provider capability.

use crate::error::IdentityError;
use crate::types::AccountCredential;
use async_trait::async_trait;

/// Credential verification and account creation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an email/password account.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountCredential, IdentityError>;

    /// Verify email/password and return the matching account.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountCredential, IdentityError>;

    /// Delete an account previously returned by this provider.
    async fn delete_account(&self, credential: &AccountCredential) -> Result<(), IdentityError>;

    /// Check whether the provider is reachable.
    async fn health_check(&self) -> bool {
        true
    }
}
