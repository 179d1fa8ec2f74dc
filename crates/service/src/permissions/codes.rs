//! Synthesized permission codes. All codes are dot-separated lowercase
//! tokens, e.g. `stok.urun.ekle`.

/// Fallback access code for modules that declare no required permissions:
/// `module.<code>.access`.
pub fn module_access(module_code: &str) -> String {
    format!("module.{}.access", module_code.to_lowercase())
}

/// Page visibility: `<module>.<page>.view`.
pub fn page_view(module_code: &str, page: &str) -> String {
    format!("{}.{}.view", module_code.to_lowercase(), page.to_lowercase())
}

/// Action on a resource: `<module>.<resource>.<action>`.
pub fn action(module_code: &str, resource: &str, action: &str) -> String {
    format!(
        "{}.{}.{}",
        module_code.to_lowercase(),
        resource.to_lowercase(),
        action.to_lowercase()
    )
}

/// Data visibility level: `<module>.data.<level>`.
pub fn data_level(module_code: &str, level: &str) -> String {
    format!("{}.data.{}", module_code.to_lowercase(), level.to_lowercase())
}
