//! Credential sign-in.

use crate::error::AccountError;
use identity_client::{AccountCredential, IdentityProvider};
use std::sync::Arc;
use tracing::{info, instrument};

/// Pass-through to the identity provider. No local state, no retry.
#[derive(Clone)]
pub struct SessionGateway {
    identity: Arc<dyn IdentityProvider>,
}

impl SessionGateway {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self { identity }
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AccountCredential, AccountError> {
        let credential = self.identity.verify_credentials(email, password).await?;
        info!(account_id = %credential.account_id, "Signed in");
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use identity_client::{IdentityError, MemoryIdentityProvider};

    #[tokio::test]
    async fn test_sign_in_delegates() {
        let identity = Arc::new(MemoryIdentityProvider::default());
        let created = identity
            .create_account("s@school.edu", "secret123")
            .await
            .unwrap();
        let gateway = SessionGateway::new(identity);

        let credential = gateway.sign_in("s@school.edu", "secret123").await.unwrap();
        assert_eq!(credential.account_id, created.account_id);

        assert!(matches!(
            gateway.sign_in("s@school.edu", "nope").await,
            Err(AccountError::Identity(IdentityError::WrongPassword))
        ));
        assert!(matches!(
            gateway.sign_in("x@school.edu", "secret123").await,
            Err(AccountError::Identity(IdentityError::UserNotFound))
        ));
    }
}
