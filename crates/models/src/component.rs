use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a runtime component owned by a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Model,
    Service,
    Route,
    Middleware,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentKind::Model => "model",
            ComponentKind::Service => "service",
            ComponentKind::Route => "route",
            ComponentKind::Middleware => "middleware",
        };
        f.write_str(s)
    }
}

/// Catalog entry for a materialized component; its lifetime is bound to the
/// owning module's activation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedComponent {
    pub module_code: String,
    pub kind: ComponentKind,
    pub name: String,
}

/// Catalog key: `<module_code>.<component_name>`.
pub fn component_key(module_code: &str, name: &str) -> String {
    format!("{module_code}.{name}")
}

/// Prefix matching all catalog keys owned by a module.
pub fn module_key_prefix(module_code: &str) -> String {
    format!("{module_code}.")
}
