//! Two-tier permission cache plumbing.
//!
//! The distributed tier sits behind the [`backend::DistributedCache`] trait;
//! [`service::PermissionCacheService`] is the thin namespaced wrapper the rest
//! of the core talks to. Backend outages degrade to cache misses.

pub mod backend;
pub mod keys;
pub mod service;

pub use backend::{CacheBackendError, DistributedCache};
pub use service::PermissionCacheService;
