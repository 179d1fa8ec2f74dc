use thiserror::Error;

/// Business errors for module registry workflows.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module already registered: {0}")]
    DuplicateModule(String),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("module not found: {0}")]
    ModuleNotFound(String),
    #[error("unmet dependencies: missing {missing:?}, inactive {inactive:?}")]
    Dependency { missing: Vec<String>, inactive: Vec<String> },
    #[error("active modules still depend on this module: {dependents:?}")]
    DependentModules { dependents: Vec<String> },
    #[error("module is currently active: {0}")]
    ModuleActive(String),
}

impl RegistryError {
    /// Stable numeric code for external mapping/logging.
    pub fn code(&self) -> u16 {
        match self {
            RegistryError::DuplicateModule(_) => 2001,
            RegistryError::MissingField(_) => 2002,
            RegistryError::Validation(_) => 2003,
            RegistryError::ModuleNotFound(_) => 2004,
            RegistryError::Dependency { .. } => 2005,
            RegistryError::DependentModules { .. } => 2006,
            RegistryError::ModuleActive(_) => 2007,
        }
    }
}
