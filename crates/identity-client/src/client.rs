//! Identity toolkit REST client.

use crate::error::IdentityError;
use crate::provider::IdentityProvider;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default identity toolkit endpoint.
pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// Client for a hosted identity toolkit (`accounts:signUp`,
/// `accounts:signInWithPassword`, `accounts:delete`).
#[derive(Clone)]
pub struct FirebaseAuthClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FirebaseAuthClient {
    /// Create a new identity toolkit client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<Response, IdentityError> {
        let response = self
            .client
            .post(format!("{}/v1/accounts:{}", self.base_url, method))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        warn!(%status, method, "Identity toolkit call failed");

        match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => Err(IdentityError::from_provider_message(&envelope.error.message)),
            Err(_) => Err(IdentityError::Unknown(format!("{}: {}", status, text))),
        }
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AccountCredential, IdentityError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };

        let response: AuthResponse = self.call(method, &request).await?.json().await?;

        Ok(AccountCredential {
            account_id: AccountId::new(response.local_id),
            email: response.email.unwrap_or_else(|| email.to_string()),
            id_token: response.id_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    #[instrument(skip(self, password))]
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountCredential, IdentityError> {
        let credential = self.password_call("signUp", email, password).await?;
        debug!("Created account {}", credential.account_id);
        Ok(credential)
    }

    #[instrument(skip(self, password))]
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountCredential, IdentityError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    #[instrument(skip(self, credential), fields(account_id = %credential.account_id))]
    async fn delete_account(&self, credential: &AccountCredential) -> Result<(), IdentityError> {
        let id_token = credential.id_token.as_deref().ok_or_else(|| {
            IdentityError::Unknown("cannot delete account without an ID token".into())
        })?;

        self.call("delete", &DeleteRequest { id_token }).await?;
        debug!("Deleted account {}", credential.account_id);
        Ok(())
    }
}
