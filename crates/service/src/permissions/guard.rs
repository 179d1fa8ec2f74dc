use std::sync::Arc;

use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use super::service::PermissionManager;

/// How a multi-code requirement combines: every code or at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireMode {
    All,
    Any,
}

/// Outcome of a guard evaluation, mapped by the HTTP layer to a response.
///
/// `CheckFailed` covers evaluation blowing up; guards fail safe, never open.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GuardOutcome {
    Allowed,
    AuthenticationRequired,
    Forbidden { missing: Vec<String> },
    CheckFailed,
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardOutcome::Allowed)
    }
}

/// Require the actor to hold the given permissions (all or any).
pub async fn require_permissions(
    manager: Arc<PermissionManager>,
    user_id: Option<Uuid>,
    permissions: Vec<String>,
    mode: RequireMode,
) -> GuardOutcome {
    let Some(user_id) = user_id else {
        return GuardOutcome::AuthenticationRequired;
    };
    let task = tokio::spawn({
        let manager = Arc::clone(&manager);
        let codes = permissions.clone();
        async move {
            match mode {
                RequireMode::All => manager.missing_permissions(user_id, &codes).await,
                RequireMode::Any => {
                    if manager.has_any_permission(user_id, &codes).await {
                        Vec::new()
                    } else {
                        codes
                    }
                }
            }
        }
    });
    match task.await {
        Ok(missing) if missing.is_empty() => GuardOutcome::Allowed,
        Ok(missing) => GuardOutcome::Forbidden { missing },
        Err(e) => {
            error!(%user_id, error = %e, "permission evaluation failed");
            GuardOutcome::CheckFailed
        }
    }
}

/// Require the actor to have access to a module.
pub async fn require_module_access(
    manager: Arc<PermissionManager>,
    user_id: Option<Uuid>,
    module_code: &str,
) -> GuardOutcome {
    let Some(user_id) = user_id else {
        return GuardOutcome::AuthenticationRequired;
    };
    let task = tokio::spawn({
        let manager = Arc::clone(&manager);
        let code = module_code.to_string();
        async move { manager.has_module_access(user_id, &code).await }
    });
    match task.await {
        Ok(true) => GuardOutcome::Allowed,
        Ok(false) => GuardOutcome::Forbidden {
            missing: vec![super::codes::module_access(module_code)],
        },
        Err(e) => {
            error!(%user_id, %module_code, error = %e, "module access evaluation failed");
            GuardOutcome::CheckFailed
        }
    }
}
