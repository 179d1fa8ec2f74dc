use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::cache::backend::memory::InMemoryCache;
use service::coordinator::Coordinator;

use crate::routes;
use crate::state::AppState;

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr() -> anyhow::Result<SocketAddr> {
    let (host, port) = match configs::load_default() {
        Ok(cfg) => {
            let s = cfg.server;
            (s.host, s.port)
        }
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8081);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Public entry: wire the core together and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cache_cfg = configs::load_default().map(|c| c.cache).unwrap_or_default();

    // Single-node deployments run on the in-memory backend; clustered ones
    // swap in a client for the shared cache here.
    let backend = Arc::new(InMemoryCache::new());
    let coordinator = Coordinator::bootstrap(backend, &cache_cfg);

    // Business modules registered before startup get their components loaded
    let report = coordinator.startup().await;
    info!(
        loaded = report.reports.len(),
        failed = report.failed.len(),
        "active modules loaded"
    );

    let state = AppState { coordinator: Arc::clone(&coordinator) };
    let cors = build_cors();
    let app: Router = routes::build_router(cors, state);

    let addr = load_bind_addr()?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    coordinator.shutdown().await;
    Ok(())
}
