//! HTTP API for the account backend.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::backend::Backend;
use crate::dashboard::TeamDashboard;
use crate::messaging::Messaging;
use crate::profile::ProfileService;
use crate::registrar::AccountRegistrar;
use crate::roles::RoleResolver;
use crate::session::SessionGateway;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Identity provider and document store
    pub backend: Backend,
    pub registrar: AccountRegistrar,
    pub roles: RoleResolver,
    pub sessions: SessionGateway,
    pub profiles: ProfileService,
    pub dashboard: TeamDashboard,
    pub messaging: Messaging,
}

impl AppState {
    /// Wire every component to the same backend.
    pub fn new(backend: Backend) -> Self {
        let store = backend.store.clone();
        Self {
            registrar: AccountRegistrar::new(backend.clone()),
            roles: RoleResolver::new(store.clone()),
            sessions: SessionGateway::new(backend.identity.clone()),
            profiles: ProfileService::new(store.clone()),
            dashboard: TeamDashboard::new(store.clone()),
            messaging: Messaging::new(store),
            backend,
        }
    }
}

/// Create the API router with the default rate limit.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(120))
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let v1 = Router::new()
        .route("/v1/admins", post(handlers::register_admin))
        .route("/v1/students", post(handlers::register_student))
        .route("/v1/teams/:team_id", get(handlers::verify_team))
        .route("/v1/sessions", post(handlers::sign_in))
        .route("/v1/accounts/:uid/role", get(handlers::get_role))
        .route(
            "/v1/accounts/:uid/profile",
            get(handlers::get_profile).put(handlers::save_profile),
        )
        .route("/v1/admins/:uid/students/count", get(handlers::student_count))
        .route("/v1/admins/:uid/messages", post(handlers::send_team_message))
        .route("/v1/messages", post(handlers::send_private_message))
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        .merge(v1)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
