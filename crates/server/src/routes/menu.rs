use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::permission::UserGrants;
use serde::Deserialize;
use service::permissions::{require_permissions, GuardOutcome, MenuSection, RequireMode};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::guard_response;
use crate::state::AppState;

/// Identity layer pushes the actor's grants here per authenticated session.
pub async fn load_user_permissions(
    State(state): State<AppState>,
    Json(grants): Json<UserGrants>,
) -> Json<serde_json::Value> {
    state
        .coordinator
        .permissions()
        .load_user_permissions(grants.user_id, grants.permissions, grants.roles)
        .await;
    Json(serde_json::json!({"ok": true}))
}

#[derive(Deserialize)]
pub struct CheckInput {
    pub permissions: Vec<String>,
    #[serde(default)]
    pub any: bool,
}

/// Evaluate a permission requirement for an actor; guard outcomes map to
/// 401/403/500 and a pass returns the outcome body.
pub async fn check_permissions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(input): Json<CheckInput>,
) -> Response {
    let mode = if input.any { RequireMode::Any } else { RequireMode::All };
    let outcome = require_permissions(
        Arc::clone(state.coordinator.permissions()),
        Some(user_id),
        input.permissions,
        mode,
    )
    .await;
    if let Some(denied) = guard_response(&outcome) {
        return denied;
    }
    Json(GuardOutcome::Allowed).into_response()
}

pub async fn user_menu(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Json<Vec<MenuSection>> {
    let menu = state.coordinator.user_menu(user_id).await;
    Json(menu.as_ref().clone())
}
