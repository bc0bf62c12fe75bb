//! Collaborator and account handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use portal_core::error::Fault;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::middleware::AuthUser;
use crate::models::UserOption;
use crate::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCollaboratorRequest {
    pub email: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCollaboratorRequest {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(rename = "hasEditPermissions")]
    pub has_edit_permissions: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePoliciesRequest {
    #[serde(rename = "acceptedPolicies", default)]
    pub accepted_policies: bool,
}

#[derive(Debug, Serialize)]
pub struct SetPasswordResponse {
    pub success: bool,
    pub token: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/users/get_options
pub async fn get_options(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<BTreeMap<String, UserOption>>, Fault> {
    Ok(Json(state.directory.collaborator_options(&user).await?))
}

/// GET /api/users/get_analyst_options
pub async fn get_analyst_options(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<BTreeMap<String, UserOption>>, Fault> {
    Ok(Json(state.directory.analyst_options().await?))
}

/// POST /api/project/:guid/collaborators/create
pub async fn create_collaborator(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(project_guid): Path<String>,
    Json(req): Json<CreateCollaboratorRequest>,
) -> Result<Json<Value>, Fault> {
    let body = state
        .directory
        .create_collaborator(&user, &project_guid, req.email, req.first_name, req.last_name)
        .await?;
    Ok(Json(body))
}

/// POST /api/project/:guid/collaborators/:username/update
pub async fn update_collaborator(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((project_guid, username)): Path<(String, String)>,
    Json(req): Json<UpdateCollaboratorRequest>,
) -> Result<Json<Value>, Fault> {
    let body = state
        .directory
        .update_collaborator(
            &user,
            &project_guid,
            &username,
            req.first_name,
            req.last_name,
            req.has_edit_permissions,
        )
        .await?;
    Ok(Json(body))
}

/// POST /api/project/:guid/collaborators/:username/delete
pub async fn delete_collaborator(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((project_guid, username)): Path<(String, String)>,
) -> Result<Json<Value>, Fault> {
    let body = state
        .directory
        .delete_collaborator(&user, &project_guid, &username)
        .await?;
    Ok(Json(body))
}

/// POST /api/users/:username/set_password
///
/// Completes account setup from the emailed link and signs the user in.
/// Deliberately unauthenticated: the caller does not have a session yet.
pub async fn set_password(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<Json<SetPasswordResponse>, Fault> {
    let user = state
        .directory
        .set_password(&username, req.password, req.first_name, req.last_name)
        .await?;

    let token = state.sessions.issue(&user.username);
    tracing::info!("Set password for user {}", user.email);
    Ok(Json(SetPasswordResponse {
        success: true,
        token,
    }))
}

/// POST /api/users/forgot_password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, Fault> {
    state.directory.forgot_password(req.email).await?;
    Ok(Json(json!({"success": true})))
}

/// POST /api/users/update_policies
pub async fn update_policies(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdatePoliciesRequest>,
) -> Result<Json<Value>, Fault> {
    let body = state
        .directory
        .update_policies(&user, req.accepted_policies)
        .await?;
    Ok(Json(body))
}
