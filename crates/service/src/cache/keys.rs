//! Key namespaces for the distributed cache tier.
//!
//! Every key the core writes goes through one of these builders so that
//! invalidation by prefix stays reliable.

use uuid::Uuid;

pub const USER_PERMISSIONS: &str = "perm:user";
pub const ROLE_PERMISSIONS: &str = "perm:role";
pub const MODULE_PERMISSIONS: &str = "perm:module";
pub const USER_MENU: &str = "menu:user";
pub const POINT_CHECK: &str = "perm:check";

/// Full effective permission set of a user.
pub fn user_permissions(user_id: Uuid) -> String {
    format!("{USER_PERMISSIONS}:{user_id}")
}

/// Permission set granted by a role.
pub fn role_permissions(role_id: &str) -> String {
    format!("{ROLE_PERMISSIONS}:{role_id}")
}

/// Permissions required by a module.
pub fn module_permissions(module_code: &str) -> String {
    format!("{MODULE_PERMISSIONS}:{module_code}")
}

/// Generated navigation menu of a user.
pub fn user_menu(user_id: Uuid) -> String {
    format!("{USER_MENU}:{user_id}")
}

/// Single (user, permission) boolean check.
pub fn point_check(user_id: Uuid, permission: &str) -> String {
    format!("{POINT_CHECK}:{user_id}:{permission}")
}

/// Prefix pattern matching every point-check entry of a user.
pub fn point_check_prefix(user_id: Uuid) -> String {
    format!("{POINT_CHECK}:{user_id}:")
}
