//! API request and response types.

use crate::records::{Profile, Role, TeamId};
use document_store::Fields;
use identity_client::AccountId;
use serde::{Deserialize, Serialize};

/// Signup request for either role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub team_id: String,

    /// Free-form profile fields (name, department, ...)
    #[serde(default)]
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSignupResponse {
    pub uid: AccountId,
    pub team_id: TeamId,
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSignupResponse {
    pub uid: AccountId,
    pub admin_uid: AccountId,
    pub team_id: TeamId,
    pub role: Role,
}

/// Team ID lookup result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub team_id: String,
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub uid: AccountId,
    pub email: String,
    /// `None` when the credential has no directory record
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub uid: AccountId,
    pub role: Role,
    pub team_id: TeamId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_uid: Option<AccountId>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub uid: AccountId,
    pub profile: Fields,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCountResponse {
    pub admin_uid: AccountId,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct TeamMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessageRequest {
    pub sender_uid: AccountId,
    pub receiver_uid: AccountId,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub account_count: usize,
    pub identity_healthy: bool,
}
