//! In-memory identity provider.

use crate::error::IdentityError;
use crate::provider::IdentityProvider;
use crate::types::{AccountCredential, AccountId};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

/// Minimum password length accepted at account creation.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Default number of consecutive failed sign-ins before an account is locked.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

const ACCOUNT_ID_LEN: usize = 28;

struct StoredAccount {
    account_id: AccountId,
    email: String,
    password_hash: String,
    failed_attempts: u32,
}

/// Identity provider keeping accounts in process memory.
///
/// Emails are matched case-insensitively. Passwords are stored as Argon2id
/// hashes. After `max_failed_attempts` consecutive wrong passwords the
/// account answers [`IdentityError::TooManyAttempts`].
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, StoredAccount>>,
    max_failed_attempts: u32,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILED_ATTEMPTS)
    }
}

impl MemoryIdentityProvider {
    pub fn new(max_failed_attempts: u32) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            max_failed_attempts: max_failed_attempts.max(1),
        }
    }

    /// Number of accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Whether an account exists for this email.
    pub async fn contains_email(&self, email: &str) -> bool {
        self.accounts.read().await.contains_key(&normalize_email(email))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn generate_account_id() -> AccountId {
    let id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ACCOUNT_ID_LEN)
        .map(char::from)
        .collect();
    AccountId::new(id)
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Unknown(format!("password hashing failed: {}", e)))
}

fn password_matches(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    #[instrument(skip(self, password))]
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountCredential, IdentityError> {
        let key = normalize_email(email);
        if !looks_like_email(&key) {
            return Err(IdentityError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.accounts.read().await.contains_key(&key) {
            return Err(IdentityError::EmailInUse);
        }

        let password_hash = hash_password(password)?;

        let mut accounts = self.accounts.write().await;
        // Re-check under the write lock; hashing ran unlocked.
        if accounts.contains_key(&key) {
            return Err(IdentityError::EmailInUse);
        }

        let account_id = generate_account_id();
        accounts.insert(
            key.clone(),
            StoredAccount {
                account_id: account_id.clone(),
                email: key.clone(),
                password_hash,
                failed_attempts: 0,
            },
        );

        debug!("Created account {}", account_id);
        Ok(AccountCredential {
            account_id,
            email: key,
            id_token: None,
        })
    }

    #[instrument(skip(self, password))]
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccountCredential, IdentityError> {
        let key = normalize_email(email);
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&key).ok_or(IdentityError::UserNotFound)?;

        if account.failed_attempts >= self.max_failed_attempts {
            warn!("Sign-in refused for locked account {}", account.account_id);
            return Err(IdentityError::TooManyAttempts);
        }

        if !password_matches(password, &account.password_hash) {
            account.failed_attempts += 1;
            return Err(IdentityError::WrongPassword);
        }

        account.failed_attempts = 0;
        Ok(AccountCredential {
            account_id: account.account_id.clone(),
            email: account.email.clone(),
            id_token: None,
        })
    }

    #[instrument(skip(self, credential), fields(account_id = %credential.account_id))]
    async fn delete_account(&self, credential: &AccountCredential) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|_, account| account.account_id != credential.account_id);

        if accounts.len() == before {
            return Err(IdentityError::UserNotFound);
        }
        debug!("Deleted account {}", credential.account_id);
        Ok(())
    }
}
