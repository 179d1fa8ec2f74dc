use std::sync::Arc;

use service::coordinator::Coordinator;

/// Shared handler state; the coordinator owns the whole core.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}
