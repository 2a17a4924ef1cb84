//! HTTP request handlers.

use super::types::{
    AdminSignupResponse, HealthResponse, MessageResponse, PrivateMessageRequest,
    ProfileResponse, RoleResponse, SessionResponse, SignInRequest, SignupRequest,
    StudentCountResponse, StudentSignupResponse, TeamMessageRequest, TeamResponse,
};
use super::AppState;
use crate::error::AccountError;
use crate::records::{collection, Profile, Role, USERS};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use identity_client::AccountId;
use regex::Regex;
use tracing::{info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AccountError> {
    let account_count = state.backend.store.count(&collection(USERS)?).await?;
    let identity_healthy = state.backend.identity.health_check().await;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        account_count,
        identity_healthy,
    }))
}

/// Register an administrator and claim their Team ID.
pub async fn register_admin(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AdminSignupResponse>), AccountError> {
    check_email(&request.email)?;
    info!(team_id = %request.team_id, "Administrator signup received");

    let registration = state
        .registrar
        .register_administrator(
            &request.email,
            &request.password,
            &request.team_id,
            request.profile,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AdminSignupResponse {
            uid: registration.account_id,
            team_id: registration.team_id,
            role: Role::Admin,
        }),
    ))
}

/// Register a student into an existing team.
pub async fn register_student(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<StudentSignupResponse>), AccountError> {
    check_email(&request.email)?;
    info!(team_id = %request.team_id, "Student signup received");

    let registration = state
        .registrar
        .register_student(
            &request.email,
            &request.password,
            &request.team_id,
            request.profile,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StudentSignupResponse {
            uid: registration.account_id,
            admin_uid: registration.admin_id,
            team_id: registration.team_id,
            role: Role::Student,
        }),
    ))
}

/// Check whether a Team ID belongs to a registered administrator.
pub async fn verify_team(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<TeamResponse>, AccountError> {
    let valid = state.registrar.directory().verify(&team_id).await?;
    Ok(Json(TeamResponse { team_id, valid }))
}

/// Sign in with email and password.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, AccountError> {
    check_email(&request.email)?;

    let credential = state
        .sessions
        .sign_in(&request.email, &request.password)
        .await?;

    let role = state
        .roles
        .lookup(&credential.account_id)
        .await?
        .map(|account| account.role());
    if role.is_none() {
        warn!(account_id = %credential.account_id, "Signed-in account has no directory record");
    }

    Ok(Json(SessionResponse {
        uid: credential.account_id,
        email: credential.email,
        role,
        id_token: credential.id_token,
    }))
}

/// Resolve an account's role.
pub async fn get_role(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<RoleResponse>, AccountError> {
    let account = state.roles.resolve_role(&AccountId::new(uid)).await?;

    Ok(Json(RoleResponse {
        uid: account.account_id().clone(),
        role: account.role(),
        team_id: account.team_id().clone(),
        admin_uid: account.admin_id().cloned(),
    }))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<ProfileResponse>, AccountError> {
    let uid = AccountId::new(uid);
    let profile = state
        .profiles
        .get_profile(&uid)
        .await?
        .ok_or_else(|| AccountError::NotFound(format!("profile for {}", uid)))?;

    Ok(Json(ProfileResponse { uid, profile }))
}

pub async fn save_profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(profile): Json<Profile>,
) -> Result<StatusCode, AccountError> {
    state
        .profiles
        .save_profile(&AccountId::new(uid), profile)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn student_count(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<StudentCountResponse>, AccountError> {
    let admin_uid = AccountId::new(uid);
    let count = state.dashboard.student_count(&admin_uid).await?;
    Ok(Json(StudentCountResponse { admin_uid, count }))
}

pub async fn send_team_message(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(request): Json<TeamMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AccountError> {
    let id = state
        .messaging
        .send_team_message(&AccountId::new(uid), &request.message)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { id })))
}

pub async fn send_private_message(
    State(state): State<AppState>,
    Json(request): Json<PrivateMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AccountError> {
    let id = state
        .messaging
        .send_private_message(&request.sender_uid, &request.receiver_uid, &request.message)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { id })))
}

fn check_email(email: &str) -> Result<(), AccountError> {
    if valid_email(email) {
        Ok(())
    } else {
        Err(AccountError::Validation(format!("invalid email address '{}'", email)))
    }
}

/// Loose `local@domain.tld` shape check. The identity provider has the final say.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}
