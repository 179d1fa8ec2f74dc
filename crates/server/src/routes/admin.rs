use axum::extract::{Path, Query, State};
use axum::Json;
use models::module::{Module, ModuleDefinition, ModuleStatus};
use serde::Deserialize;
use serde_json::Value;
use service::coordinator::SystemStatus;
use service::loader::LoadReport;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListModulesQuery {
    pub category: Option<String>,
}

pub async fn list_modules(
    State(state): State<AppState>,
    Query(query): Query<ListModulesQuery>,
) -> Json<Vec<Module>> {
    let registry = state.coordinator.registry();
    let modules = match query.category {
        Some(category) => registry.get_modules_by_category(&category).await,
        None => registry.get_all_modules().await,
    };
    Json(modules)
}

pub async fn get_module(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Module>, ApiError> {
    state
        .coordinator
        .registry()
        .get(&code)
        .await
        .map(Json)
        .ok_or_else(|| service::registry::RegistryError::ModuleNotFound(code).into())
}

pub async fn register_module(
    State(state): State<AppState>,
    Json(definition): Json<ModuleDefinition>,
) -> Result<Json<Module>, ApiError> {
    // manifests are registered in-process by the module itself, not over HTTP
    let module = state.coordinator.register_module(definition, None).await?;
    Ok(Json(module))
}

pub async fn enable_module(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<LoadReport>, ApiError> {
    let report = state.coordinator.enable_module(&code).await?;
    Ok(Json(report))
}

pub async fn disable_module(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Module>, ApiError> {
    let module = state.coordinator.disable_module(&code).await?;
    Ok(Json(module))
}

#[derive(Deserialize)]
pub struct SetStatusInput {
    pub status: ModuleStatus,
}

pub async fn set_module_status(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<SetStatusInput>,
) -> Result<Json<Module>, ApiError> {
    let module = state.coordinator.set_module_status(&code, input.status).await?;
    Ok(Json(module))
}

#[derive(Deserialize)]
pub struct ConfigQuery {
    pub key: Option<String>,
}

pub async fn get_module_config(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ConfigQuery>,
) -> Result<Json<Value>, ApiError> {
    state
        .coordinator
        .module_config()
        .get_module_config(&code, query.key.as_deref())
        .await
        .map(Json)
        .ok_or_else(|| service::module_config::ConfigError::NotRegistered(code).into())
}

#[derive(Deserialize)]
pub struct UpdateConfigInput {
    pub config: Value,
    #[serde(default = "default_merge")]
    pub merge: bool,
}

fn default_merge() -> bool {
    true
}

pub async fn update_module_config(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<UpdateConfigInput>,
) -> Result<Json<Value>, ApiError> {
    let updated = state
        .coordinator
        .module_config()
        .update_module_config(&code, input.config, input.merge)
        .await?;
    Ok(Json(updated))
}

pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(state.coordinator.system_status().await)
}
