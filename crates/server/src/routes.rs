use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use common::types::Health;

use crate::state::AppState;

pub mod admin;
pub mod menu;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health, admin and menu/permission
/// routes. Business-module routes are mounted by their own modules under
/// `/api/<code>` and are not part of this core surface.
pub fn build_router(cors: CorsLayer, state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/modules", get(admin::list_modules).post(admin::register_module))
        .route("/admin/modules/:code", get(admin::get_module))
        .route("/admin/modules/:code/enable", post(admin::enable_module))
        .route("/admin/modules/:code/disable", post(admin::disable_module))
        .route("/admin/modules/:code/status", put(admin::set_module_status))
        .route(
            "/admin/modules/:code/config",
            get(admin::get_module_config).put(admin::update_module_config),
        )
        .route("/admin/system/status", get(admin::system_status));

    let menu_routes = Router::new()
        .route("/api/permissions/load", post(menu::load_user_permissions))
        .route("/api/permissions/:user_id/check", post(menu::check_permissions))
        .route("/api/menu/:user_id", get(menu::user_menu));

    Router::new()
        .route("/health", get(health))
        .merge(admin_routes)
        .merge(menu_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
