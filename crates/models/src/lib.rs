//! Domain records shared across the module/permission core.
//! - Keeps validation helpers next to the entities they protect.
//! - No persistence concerns: the registry is the source of truth.

pub mod component;
pub mod errors;
pub mod menu;
pub mod module;
pub mod permission;
