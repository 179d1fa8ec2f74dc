use models::module::ModuleStatus;
use thiserror::Error;

/// Business errors for component loading workflows.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("module not found: {0}")]
    ModuleNotFound(String),
    #[error("module {code} is not active (status {status})")]
    ModuleInactive { code: String, status: ModuleStatus },
    #[error("service not loaded: {0}")]
    ServiceNotFound(String),
    #[error("service construction failed for {key}: {reason}")]
    Construction { key: String, reason: String },
}

impl LoaderError {
    /// Stable numeric code for external mapping/logging.
    pub fn code(&self) -> u16 {
        match self {
            LoaderError::ModuleNotFound(_) => 3001,
            LoaderError::ModuleInactive { .. } => 3002,
            LoaderError::ServiceNotFound(_) => 3003,
            LoaderError::Construction { .. } => 3101,
        }
    }
}
