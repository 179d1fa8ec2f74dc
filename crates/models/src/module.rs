use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::menu::MenuItem;

/// Lifecycle status of a registered module.
///
/// INACTIVE -> ACTIVE is gated by the dependency graph; ACTIVE -> INACTIVE
/// is gated by active dependents. MAINTENANCE/TRIAL/EXPIRED are set directly
/// by the caller and bypass the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleStatus {
    Inactive,
    Active,
    Maintenance,
    Trial,
    Expired,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleStatus::Inactive => "INACTIVE",
            ModuleStatus::Active => "ACTIVE",
            ModuleStatus::Maintenance => "MAINTENANCE",
            ModuleStatus::Trial => "TRIAL",
            ModuleStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

impl FromStr for ModuleStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INACTIVE" => Ok(ModuleStatus::Inactive),
            "ACTIVE" => Ok(ModuleStatus::Active),
            "MAINTENANCE" => Ok(ModuleStatus::Maintenance),
            "TRIAL" => Ok(ModuleStatus::Trial),
            "EXPIRED" => Ok(ModuleStatus::Expired),
            other => Err(ModelError::Validation(format!("unknown module status: {other}"))),
        }
    }
}

/// Declared HTTP route of a module; the handler is referenced by name and
/// resolved through the module's manifest at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSpec {
    pub path: String,
    pub handler: String,
}

/// Registration input supplied by a business module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub middleware: Vec<String>,
}

/// Registered module (registry view).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub code: String,
    pub name: String,
    pub version: String,
    pub category: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
    pub permissions: Vec<String>,
    pub routes: Vec<RouteSpec>,
    pub menu_items: Vec<MenuItem>,
    pub status: ModuleStatus,
    pub registered_at: DateTime<Utc>,
    pub last_activated_at: Option<DateTime<Utc>>,
}

impl Module {
    /// Build the registry record from a validated definition; new modules
    /// always start INACTIVE.
    pub fn from_definition(def: ModuleDefinition) -> Self {
        Self {
            code: def.code,
            name: def.name,
            version: def.version.unwrap_or_else(|| "1.0.0".to_string()),
            category: def.category.unwrap_or_else(|| "GENERAL".to_string()),
            icon: def.icon,
            color: def.color,
            description: def.description,
            dependencies: def.dependencies,
            permissions: def.permissions,
            routes: def.routes,
            menu_items: def.menu_items,
            status: ModuleStatus::Inactive,
            registered_at: Utc::now(),
            last_activated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ModuleStatus::Active
    }

    /// API mount prefix for the module's route components.
    pub fn mount_prefix(&self) -> String {
        format!("/api/{}", self.code.to_lowercase())
    }
}

/// Module codes are short identifiers: letters, digits, `_` and `-`.
pub fn validate_code(code: &str) -> Result<(), ModelError> {
    if code.trim().is_empty() {
        return Err(ModelError::Validation("module code must not be empty".into()));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(ModelError::Validation(format!("invalid module code: {code}")));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::Validation("module name must not be empty".into()));
    }
    Ok(())
}
