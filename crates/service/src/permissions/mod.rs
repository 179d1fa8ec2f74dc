//! Effective-permission resolution, module/page/action/data-level checks,
//! navigation menu generation and the guard entry points.

pub mod codes;
pub mod guard;
pub mod menu;
pub mod service;

pub use guard::{require_module_access, require_permissions, GuardOutcome, RequireMode};
pub use menu::{MenuModuleEntry, MenuSection};
pub use service::PermissionManager;
