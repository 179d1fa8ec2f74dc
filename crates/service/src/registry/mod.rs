//! Source of truth for module metadata, status and dependency edges.

pub mod errors;
pub mod service;

pub use errors::RegistryError;
pub use service::{DependencyReport, ModuleRegistry};
