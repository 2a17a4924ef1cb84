//! Stored account records and collection layout.
//!
//! Layout in the document store:
//!
//! ```text
//! admins/{uid}                     administrator record
//! admins/{uid}/students/{auto}     team membership entries
//! admins/{uid}/teamMessages/{auto} team broadcast messages
//! students/{uid}                   student record
//! users/{uid}                      unified record (either role)
//! teams/{teamId}                   team claim guard
//! privateMessages/{auto}           direct messages
//! ```

use crate::error::AccountError;
use chrono::{DateTime, Utc};
use document_store::{CollectionPath, Fields, StoreError};
use identity_client::AccountId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const ADMINS: &str = "admins";
pub const STUDENTS: &str = "students";
pub const USERS: &str = "users";
pub const TEAMS: &str = "teams";
pub const PRIVATE_MESSAGES: &str = "privateMessages";
pub const TEAM_STUDENTS: &str = "students";
pub const TEAM_MESSAGES: &str = "teamMessages";

/// Minimum Team ID length, in characters.
pub const MIN_TEAM_ID_LEN: usize = 6;

/// Record fields owned by the backend; profiles may not set them.
pub const RESERVED_FIELDS: &[&str] = &[
    "uid",
    "email",
    "teamId",
    "role",
    "adminUid",
    "createdAt",
    "joinedAt",
    "updatedAt",
];

/// Path of a top-level collection.
pub fn collection(name: &str) -> Result<CollectionPath, StoreError> {
    CollectionPath::new(name)
}

/// Path of a subcollection under an administrator.
pub fn admin_child(admin_id: &AccountId, name: &str) -> Result<CollectionPath, StoreError> {
    collection(ADMINS)?.child(admin_id.as_str(), name)
}

/// Shared token binding students to an administrator.
///
/// Case-sensitive, at least [`MIN_TEAM_ID_LEN`] characters, never trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    /// Validate a Team ID. Purely local.
    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        if raw.chars().count() < MIN_TEAM_ID_LEN {
            return Err(AccountError::Validation(format!(
                "Team ID must be at least {} characters long",
                MIN_TEAM_ID_LEN
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document key of the `teams` claim. Percent-encoded, so any Team ID
    /// (including one with `/`) maps to a distinct valid key.
    pub fn claim_key(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Student => f.write_str("student"),
        }
    }
}

/// Free-form profile fields (name, phone, studentId, department, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(Fields);

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, builder style.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Reject profiles that try to overwrite backend-owned fields.
    pub fn validate(&self) -> Result<(), AccountError> {
        match self.0.keys().find(|k| RESERVED_FIELDS.contains(&k.as_str())) {
            Some(key) => Err(AccountError::Validation(format!(
                "profile field '{}' is reserved",
                key
            ))),
            None => Ok(()),
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn into_fields(self) -> Fields {
        self.0
    }
}

impl From<Fields> for Profile {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}

/// Administrator record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub uid: AccountId,
    pub email: String,
    pub team_id: TeamId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: Fields,
}

/// Student record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub uid: AccountId,
    pub email: String,
    pub admin_uid: AccountId,
    pub team_id: TeamId,
    pub joined_at: DateTime<Utc>,
    #[serde(flatten)]
    pub profile: Fields,
}

/// Unified account record: one keyed lookup answers "which role?".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Account {
    Admin(AdminRecord),
    Student(StudentRecord),
}

impl Account {
    pub fn role(&self) -> Role {
        match self {
            Account::Admin(_) => Role::Admin,
            Account::Student(_) => Role::Student,
        }
    }

    pub fn account_id(&self) -> &AccountId {
        match self {
            Account::Admin(a) => &a.uid,
            Account::Student(s) => &s.uid,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Account::Admin(a) => &a.email,
            Account::Student(s) => &s.email,
        }
    }

    pub fn team_id(&self) -> &TeamId {
        match self {
            Account::Admin(a) => &a.team_id,
            Account::Student(s) => &s.team_id,
        }
    }

    /// Owning administrator, for students.
    pub fn admin_id(&self) -> Option<&AccountId> {
        match self {
            Account::Admin(_) => None,
            Account::Student(s) => Some(&s.admin_uid),
        }
    }

    pub fn profile(&self) -> &Fields {
        match self {
            Account::Admin(a) => &a.profile,
            Account::Student(s) => &s.profile,
        }
    }

    /// Serialize into document fields, including the role tag.
    pub fn to_fields(&self) -> Result<Fields, AccountError> {
        into_fields(self)
    }

    /// Decode a unified record.
    pub fn from_fields(fields: Fields) -> Result<Self, AccountError> {
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Decode a role-table record whose role is known from the table.
    pub fn from_role_fields(role: Role, mut fields: Fields) -> Result<Self, AccountError> {
        fields.remove("role");
        Ok(match role {
            Role::Admin => Account::Admin(decode(fields)?),
            Role::Student => Account::Student(decode(fields)?),
        })
    }
}

/// Serialize a value that must be a JSON object.
pub fn into_fields<T: Serialize>(value: &T) -> Result<Fields, AccountError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AccountError::Malformed(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

fn decode<T: DeserializeOwned>(fields: Fields) -> Result<T, AccountError> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}
