//! Gene list administration handlers.

use axum::{extract::State, Json};
use portal_core::error::Fault;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::AuthUser;
use crate::services::{Direction, SharingMigrator};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MigrateSharingRequest {
    pub direction: Direction,
}

/// POST /api/locus_lists/migrate_sharing
///
/// One-shot switch of every gene list between direct per-list grants and
/// project inheritance. Superusers only; individual list failures are counted
/// in the summary rather than aborting the batch.
pub async fn migrate_sharing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<MigrateSharingRequest>,
) -> Result<Json<Value>, Fault> {
    if !user.is_superuser {
        return Err(Fault::PermissionDenied(
            "Superuser access required".to_string(),
        ));
    }

    let migrator = SharingMigrator::new(
        state.acl.clone(),
        state.projects.clone(),
        state.locus_lists.clone(),
    );
    let summary = migrator.migrate_all(request.direction).await?;

    Ok(Json(json!({
        "migrated": summary.migrated,
        "failed": summary.failed,
    })))
}
