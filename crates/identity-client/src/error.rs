//! Identity provider errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Email already in use")]
    EmailInUse,

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("No account for this email")]
    UserNotFound,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Too many failed attempts, try again later")]
    TooManyAttempts,

    #[error("Identity provider error: {0}")]
    Unknown(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IdentityError {
    /// Map an identity toolkit error message (e.g. `EMAIL_EXISTS`,
    /// `WEAK_PASSWORD : Password should be at least 6 characters`).
    pub fn from_provider_message(message: &str) -> Self {
        let (code, detail) = match message.split_once(" : ") {
            Some((code, detail)) => (code.trim(), Some(detail.trim())),
            None => (message.trim(), None),
        };

        match code {
            "EMAIL_EXISTS" => IdentityError::EmailInUse,
            "WEAK_PASSWORD" => IdentityError::WeakPassword(
                detail.unwrap_or("password is too weak").to_string(),
            ),
            "INVALID_EMAIL" | "MISSING_EMAIL" => IdentityError::InvalidEmail,
            "EMAIL_NOT_FOUND" => IdentityError::UserNotFound,
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => {
                IdentityError::WrongPassword
            }
            "TOO_MANY_ATTEMPTS_TRY_LATER" => IdentityError::TooManyAttempts,
            _ => IdentityError::Unknown(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_message() {
        assert!(matches!(
            IdentityError::from_provider_message("EMAIL_EXISTS"),
            IdentityError::EmailInUse
        ));
        assert!(matches!(
            IdentityError::from_provider_message("EMAIL_NOT_FOUND"),
            IdentityError::UserNotFound
        ));
        assert!(matches!(
            IdentityError::from_provider_message("INVALID_LOGIN_CREDENTIALS"),
            IdentityError::WrongPassword
        ));
        assert!(matches!(
            IdentityError::from_provider_message("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            IdentityError::TooManyAttempts
        ));

        match IdentityError::from_provider_message(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        ) {
            IdentityError::WeakPassword(detail) => {
                assert_eq!(detail, "Password should be at least 6 characters")
            }
            other => panic!("unexpected {:?}", other),
        }

        match IdentityError::from_provider_message("USER_DISABLED") {
            IdentityError::Unknown(msg) => assert_eq!(msg, "USER_DISABLED"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
