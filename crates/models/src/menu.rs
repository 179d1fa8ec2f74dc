use serde::{Deserialize, Serialize};

/// Navigation entry declared by a module; `permission` gates visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub title: String,
    pub path: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
}

/// Fixed category ordering for the generated navigation menu; categories not
/// listed here sort after GENERAL, alphabetically.
pub const CATEGORY_PRIORITY: [&str; 8] = [
    "CORE",
    "OPERASYON",
    "SATIS",
    "MUHASEBE",
    "IK",
    "ENTEGRASYON",
    "SISTEM",
    "GENERAL",
];

/// Rank of a category in the fixed ordering; unknown categories rank last.
pub fn category_rank(category: &str) -> usize {
    CATEGORY_PRIORITY
        .iter()
        .position(|c| *c == category)
        .unwrap_or(CATEGORY_PRIORITY.len())
}
