use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::coordinator::CoordinatorError;
use service::loader::LoaderError;
use service::module_config::ConfigError;
use service::permissions::GuardOutcome;
use service::registry::RegistryError;
use tracing::error;

/// Maps core errors to HTTP responses with a stable numeric code in the body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: u16,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: u16, message: String) -> Self {
        Self { status, code, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, error = %self.message, "request failed");
        }
        (
            self.status,
            Json(serde_json::json!({"error": self.message, "code": self.code})),
        )
            .into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        let status = match &e {
            RegistryError::ModuleNotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::MissingField(_) | RegistryError::Validation(_) => StatusCode::BAD_REQUEST,
            RegistryError::DuplicateModule(_)
            | RegistryError::Dependency { .. }
            | RegistryError::DependentModules { .. }
            | RegistryError::ModuleActive(_) => StatusCode::CONFLICT,
        };
        ApiError::new(status, e.code(), e.to_string())
    }
}

impl From<LoaderError> for ApiError {
    fn from(e: LoaderError) -> Self {
        let status = match &e {
            LoaderError::ModuleNotFound(_) | LoaderError::ServiceNotFound(_) => StatusCode::NOT_FOUND,
            LoaderError::ModuleInactive { .. } => StatusCode::CONFLICT,
            LoaderError::Construction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, e.code(), e.to_string())
    }
}

impl From<CoordinatorError> for ApiError {
    fn from(e: CoordinatorError) -> Self {
        match e {
            CoordinatorError::Registry(inner) => inner.into(),
            CoordinatorError::Loader(inner) => inner.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        let status = match &e {
            ConfigError::NotRegistered(_) => StatusCode::NOT_FOUND,
            ConfigError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError::new(status, e.code(), e.to_string())
    }
}

/// Short-circuit response for a guard denial; `Allowed` yields `None`.
pub fn guard_response(outcome: &GuardOutcome) -> Option<Response> {
    let (status, message) = match outcome {
        GuardOutcome::Allowed => return None,
        GuardOutcome::AuthenticationRequired => {
            (StatusCode::UNAUTHORIZED, "authentication required")
        }
        GuardOutcome::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
        GuardOutcome::CheckFailed => {
            (StatusCode::INTERNAL_SERVER_ERROR, "permission check failed")
        }
    };
    Some((status, Json(serde_json::json!({"error": message, "outcome": outcome}))).into_response())
}
