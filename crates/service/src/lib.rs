//! Runtime core of the module/permission system.
//! - `registry`: module metadata, status and dependency gating.
//! - `loader`: component catalogs bound to a module's activation window.
//! - `permissions`: effective permission resolution and menu generation.
//! - `cache`: two-tier permission cache plumbing.
//! - `module_config`: per-module runtime configuration.
//! - `coordinator`: composition root that wires everything together.

pub mod cache;
pub mod coordinator;
pub mod loader;
pub mod module_config;
pub mod permissions;
pub mod registry;
