//! Per-module runtime configuration with schema validation and change
//! notification.

pub mod errors;
pub mod service;
pub mod validator;

pub use errors::ConfigError;
pub use service::{ChangeListener, ModuleConfigManager};
pub use validator::{create_validator, ConfigValidator, ConfigViolation, FieldRule, FieldType};
