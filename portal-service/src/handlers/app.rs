//! Application bootstrap and health handlers.

use axum::{extract::State, Json};
use portal_core::error::Fault;
use serde_json::{json, Value};

use crate::middleware::AuthUser;
use crate::AppState;

/// GET /api/bootstrap
///
/// Initial payload for the web client: deployment metadata plus the signed-in
/// user and whether they have accepted the current policies.
pub async fn bootstrap(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, Fault> {
    let current_policies = state.directory.current_policies(&user).await?;

    Ok(Json(json!({
        "meta": {
            "version": state.config.service_version,
            "debugEnabled": state.config.debug,
            "googleLoginEnabled": state.config.google_login_enabled,
        },
        "user": {
            "username": user.username,
            "email": user.email,
            "firstName": user.first_name,
            "lastName": user.last_name,
            "displayName": user.display_name(),
            "isSuperuser": user.is_superuser,
            "isActive": user.is_active,
            "currentPolicies": current_policies,
        },
    })))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    }))
}
