//! Runtime component lifecycle: materializes a module's declared components
//! into in-memory catalogs on load and tears them down on unload.
//!
//! Discovery is manifest-based: each business module registers a
//! [`manifest::ModuleManifest`] at its own initialization instead of being
//! scanned from disk.

pub mod errors;
pub mod manifest;
pub mod service;

pub use errors::LoaderError;
pub use manifest::{HandlerRef, ModuleManifest, ServiceDeps, ServiceFactory, ServiceInstance};
pub use service::{ComponentError, LoadAllReport, LoadReport, ModuleLoader, MountedRoute};
