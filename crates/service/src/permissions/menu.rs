use models::menu::{category_rank, MenuItem};
use models::module::Module;
use serde::{Deserialize, Serialize};

/// Module entry in the generated menu, carrying only permission-visible items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuModuleEntry {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    pub items: Vec<MenuItem>,
}

/// One category section of the generated menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuSection {
    pub category: String,
    pub modules: Vec<MenuModuleEntry>,
}

/// Group surviving modules by category in the fixed priority order; unknown
/// categories sort after the known ones, alphabetically. Module order inside
/// a section follows the input (registry) order.
pub fn build_sections(survivors: Vec<(Module, Vec<MenuItem>)>) -> Vec<MenuSection> {
    let mut sections: Vec<MenuSection> = Vec::new();
    for (module, items) in survivors {
        let entry = MenuModuleEntry {
            code: module.code,
            name: module.name,
            icon: module.icon,
            color: module.color,
            items,
        };
        match sections.iter_mut().find(|s| s.category == module.category) {
            Some(section) => section.modules.push(entry),
            None => sections.push(MenuSection { category: module.category, modules: vec![entry] }),
        }
    }
    sections.sort_by(|a, b| {
        category_rank(&a.category)
            .cmp(&category_rank(&b.category))
            .then_with(|| a.category.cmp(&b.category))
    });
    sections
}
