use thiserror::Error;

use super::validator::ConfigViolation;

/// Business errors for module configuration workflows.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config registered for module: {0}")]
    NotRegistered(String),
    #[error("config validation failed: {} violation(s)", .violations.len())]
    Validation { violations: Vec<ConfigViolation> },
}

impl ConfigError {
    /// Stable numeric code for external mapping/logging.
    pub fn code(&self) -> u16 {
        match self {
            ConfigError::NotRegistered(_) => 5001,
            ConfigError::Validation { .. } => 5002,
        }
    }
}
