//! Identity provider clients.
//!
//! [`IdentityProvider`] is the capability the account backend consumes:
//! create an email/password account, verify credentials, delete an account.
//! [`FirebaseAuthClient`] talks to a hosted identity toolkit over REST and
//! [`MemoryIdentityProvider`] keeps accounts in memory.

mod client;
mod error;
mod memory;
mod provider;
mod types;

pub use client::{FirebaseAuthClient, DEFAULT_BASE_URL};
pub use error::IdentityError;
pub use memory::{MemoryIdentityProvider, DEFAULT_MAX_FAILED_ATTEMPTS, MIN_PASSWORD_LENGTH};
pub use provider::IdentityProvider;
pub use types::{AccountCredential, AccountId};

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> FirebaseAuthClient {
        FirebaseAuthClient::new(mock_server.uri(), "test-key").unwrap()
    }

    fn provider_error(message: &str) -> ResponseTemplate {
        ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 400, "message": message }
        }))
    }

    #[tokio::test]
    async fn test_sign_up_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signUp"))
            .and(query_param("key", "test-key"))
            .and(body_json(serde_json::json!({
                "email": "admin@school.edu",
                "password": "secret123",
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "localId": "uid-123",
                "email": "admin@school.edu",
                "idToken": "token-abc"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let credential = client
            .create_account("admin@school.edu", "secret123")
            .await
            .unwrap();

        assert_eq!(credential.account_id.as_str(), "uid-123");
        assert_eq!(credential.email, "admin@school.edu");
        assert_eq!(credential.id_token.as_deref(), Some("token-abc"));
    }

    #[tokio::test]
    async fn test_sign_up_email_exists() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signUp"))
            .respond_with(provider_error("EMAIL_EXISTS"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.create_account("taken@school.edu", "secret123").await;

        assert!(matches!(result, Err(IdentityError::EmailInUse)));
    }

    #[tokio::test]
    async fn test_sign_up_weak_password() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signUp"))
            .respond_with(provider_error(
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.create_account("a@school.edu", "123").await;

        assert!(matches!(result, Err(IdentityError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn test_sign_in_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(provider_error("TOO_MANY_ATTEMPTS_TRY_LATER"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.verify_credentials("a@school.edu", "secret123").await;

        assert!(matches!(result, Err(IdentityError::TooManyAttempts)));
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "localId": "uid-9",
                "idToken": "tok"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let credential = client
            .verify_credentials("s@school.edu", "secret123")
            .await
            .unwrap();

        assert_eq!(credential.account_id, AccountId::new("uid-9"));
        // Falls back to the requested email when the response omits it.
        assert_eq!(credential.email, "s@school.edu");
    }

    #[tokio::test]
    async fn test_unparseable_error_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:signUp"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.create_account("a@school.edu", "secret123").await;

        match result {
            Err(IdentityError::Unknown(msg)) => assert!(msg.contains("upstream down")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_account() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/accounts:delete"))
            .and(body_json(serde_json::json!({ "idToken": "tok" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let credential = AccountCredential {
            account_id: AccountId::new("uid-1"),
            email: "a@school.edu".into(),
            id_token: Some("tok".into()),
        };
        client.delete_account(&credential).await.unwrap();

        let without_token = AccountCredential {
            id_token: None,
            ..credential
        };
        assert!(client.delete_account(&without_token).await.is_err());
    }

    // In-memory provider tests

    #[tokio::test]
    async fn test_memory_create_and_verify() {
        let provider = MemoryIdentityProvider::default();

        let created = provider
            .create_account("Admin@School.edu", "secret123")
            .await
            .unwrap();
        assert_eq!(created.email, "admin@school.edu");
        assert_eq!(created.account_id.as_str().len(), 28);

        let verified = provider
            .verify_credentials("admin@school.edu", "secret123")
            .await
            .unwrap();
        assert_eq!(verified.account_id, created.account_id);
        assert!(provider.contains_email(" ADMIN@school.edu ").await);
    }

    #[tokio::test]
    async fn test_memory_create_errors() {
        let provider = MemoryIdentityProvider::default();

        assert!(matches!(
            provider.create_account("not-an-email", "secret123").await,
            Err(IdentityError::InvalidEmail)
        ));
        assert!(matches!(
            provider.create_account("a@school.edu", "12345").await,
            Err(IdentityError::WeakPassword(_))
        ));

        provider.create_account("a@school.edu", "secret123").await.unwrap();
        assert!(matches!(
            provider.create_account("A@school.edu", "other-secret").await,
            Err(IdentityError::EmailInUse)
        ));
        assert_eq!(provider.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_memory_verify_errors_and_lockout() {
        let provider = MemoryIdentityProvider::new(2);
        provider.create_account("a@school.edu", "secret123").await.unwrap();

        assert!(matches!(
            provider.verify_credentials("nobody@school.edu", "secret123").await,
            Err(IdentityError::UserNotFound)
        ));
        assert!(matches!(
            provider.verify_credentials("a@school.edu", "wrong").await,
            Err(IdentityError::WrongPassword)
        ));
        assert!(matches!(
            provider.verify_credentials("a@school.edu", "wrong").await,
            Err(IdentityError::WrongPassword)
        ));
        assert!(matches!(
            provider.verify_credentials("a@school.edu", "secret123").await,
            Err(IdentityError::TooManyAttempts)
        ));
    }

    #[tokio::test]
    async fn test_memory_successful_sign_in_resets_failures() {
        let provider = MemoryIdentityProvider::new(2);
        provider.create_account("a@school.edu", "secret123").await.unwrap();

        let _ = provider.verify_credentials("a@school.edu", "wrong").await;
        provider
            .verify_credentials("a@school.edu", "secret123")
            .await
            .unwrap();
        let _ = provider.verify_credentials("a@school.edu", "wrong").await;

        assert!(provider
            .verify_credentials("a@school.edu", "secret123")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_memory_delete_account() {
        let provider = MemoryIdentityProvider::default();
        let credential = provider
            .create_account("a@school.edu", "secret123")
            .await
            .unwrap();

        provider.delete_account(&credential).await.unwrap();
        assert_eq!(provider.account_count().await, 0);
        assert!(matches!(
            provider.delete_account(&credential).await,
            Err(IdentityError::UserNotFound)
        ));
    }
}
