use std::collections::{HashMap, HashSet};

use chrono::Utc;
use models::module::{self, Module, ModuleDefinition, ModuleStatus};
use tokio::sync::RwLock;
use tracing::{info, instrument};

use super::errors::RegistryError;

/// Direct-dependency check result: codes never registered vs. registered but
/// not currently ACTIVE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    pub missing: Vec<String>,
    pub inactive: Vec<String>,
}

impl DependencyReport {
    pub fn satisfied(&self) -> bool {
        self.missing.is_empty() && self.inactive.is_empty()
    }
}

/// Module registry: one shared instance injected into every collaborator.
///
/// Dependency checking is single-hop by design; callers activate modules in
/// topological order themselves.
pub struct ModuleRegistry {
    modules: RwLock<HashMap<String, Module>>,
    active: RwLock<HashSet<String>>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self { modules: RwLock::new(HashMap::new()), active: RwLock::new(HashSet::new()) }
    }

    /// Register a new module; it starts INACTIVE.
    ///
    /// # Examples
    ///
    /// ```
    /// use models::module::ModuleDefinition;
    /// use service::registry::ModuleRegistry;
    ///
    /// let registry = ModuleRegistry::new();
    /// let definition = ModuleDefinition {
    ///     code: "stok".into(),
    ///     name: "Stok Yonetimi".into(),
    ///     ..Default::default()
    /// };
    /// let module = tokio_test::block_on(registry.register(definition)).unwrap();
    /// assert_eq!(module.code, "stok");
    /// assert!(!module.is_active());
    /// ```
    #[instrument(skip(self, definition), fields(code = %definition.code))]
    pub async fn register(&self, definition: ModuleDefinition) -> Result<Module, RegistryError> {
        if definition.code.trim().is_empty() {
            return Err(RegistryError::MissingField("code".into()));
        }
        if definition.name.trim().is_empty() {
            return Err(RegistryError::MissingField("name".into()));
        }
        module::validate_code(&definition.code)
            .map_err(|e| RegistryError::Validation(e.to_string()))?;
        module::validate_name(&definition.name)
            .map_err(|e| RegistryError::Validation(e.to_string()))?;

        let mut modules = self.modules.write().await;
        if modules.contains_key(&definition.code) {
            return Err(RegistryError::DuplicateModule(definition.code));
        }
        let module = Module::from_definition(definition);
        modules.insert(module.code.clone(), module.clone());
        info!(code = %module.code, name = %module.name, "module_registered");
        Ok(module)
    }

    /// Remove a module entirely; blocked while it is ACTIVE or while ACTIVE
    /// modules depend on it.
    #[instrument(skip(self))]
    pub async fn unregister(&self, code: &str) -> Result<Module, RegistryError> {
        let dependents = self.active_dependents(code).await;
        if !dependents.is_empty() {
            return Err(RegistryError::DependentModules { dependents });
        }
        let mut modules = self.modules.write().await;
        if modules.get(code).is_some_and(|m| m.is_active()) {
            return Err(RegistryError::ModuleActive(code.into()));
        }
        let removed = modules.remove(code).ok_or_else(|| RegistryError::ModuleNotFound(code.into()))?;
        info!(%code, "module_unregistered");
        Ok(removed)
    }

    /// Direct status update. ACTIVE entry/exit maintains the active set and
    /// the activation timestamp; other transitions are ungated.
    #[instrument(skip(self))]
    pub async fn set_status(&self, code: &str, status: ModuleStatus) -> Result<Module, RegistryError> {
        let mut modules = self.modules.write().await;
        let module = modules
            .get_mut(code)
            .ok_or_else(|| RegistryError::ModuleNotFound(code.into()))?;

        let previous = module.status;
        module.status = status;
        if status == ModuleStatus::Active {
            module.last_activated_at = Some(Utc::now());
        }
        let snapshot = module.clone();
        drop(modules);

        let mut active = self.active.write().await;
        if status == ModuleStatus::Active {
            active.insert(code.to_string());
        } else {
            active.remove(code);
        }
        info!(%code, from = %previous, to = %status, "module_status_changed");
        Ok(snapshot)
    }

    /// Report unmet direct dependencies of a module.
    pub async fn check_dependencies(&self, code: &str) -> Result<DependencyReport, RegistryError> {
        let modules = self.modules.read().await;
        let module = modules.get(code).ok_or_else(|| RegistryError::ModuleNotFound(code.into()))?;

        let mut report = DependencyReport::default();
        for dep in &module.dependencies {
            match modules.get(dep) {
                None => report.missing.push(dep.clone()),
                Some(m) if !m.is_active() => report.inactive.push(dep.clone()),
                Some(_) => {}
            }
        }
        Ok(report)
    }

    /// Activate a module; every declared dependency must already be ACTIVE.
    #[instrument(skip(self))]
    pub async fn activate(&self, code: &str) -> Result<Module, RegistryError> {
        let report = self.check_dependencies(code).await?;
        if !report.satisfied() {
            return Err(RegistryError::Dependency { missing: report.missing, inactive: report.inactive });
        }
        self.set_status(code, ModuleStatus::Active).await
    }

    /// Deactivate a module; blocked while any ACTIVE module depends on it.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, code: &str) -> Result<Module, RegistryError> {
        {
            let modules = self.modules.read().await;
            if !modules.contains_key(code) {
                return Err(RegistryError::ModuleNotFound(code.into()));
            }
        }
        let dependents = self.active_dependents(code).await;
        if !dependents.is_empty() {
            return Err(RegistryError::DependentModules { dependents });
        }
        self.set_status(code, ModuleStatus::Inactive).await
    }

    /// ACTIVE modules whose dependency list contains `code`, sorted.
    async fn active_dependents(&self, code: &str) -> Vec<String> {
        let modules = self.modules.read().await;
        let mut dependents: Vec<String> = modules
            .values()
            .filter(|m| m.is_active() && m.dependencies.iter().any(|d| d == code))
            .map(|m| m.code.clone())
            .collect();
        dependents.sort();
        dependents
    }

    pub async fn get(&self, code: &str) -> Option<Module> {
        self.modules.read().await.get(code).cloned()
    }

    pub async fn is_active(&self, code: &str) -> bool {
        self.active.read().await.contains(code)
    }

    /// All ACTIVE modules, sorted by name for determinism.
    pub async fn get_active_modules(&self) -> Vec<Module> {
        let modules = self.modules.read().await;
        let mut list: Vec<Module> = modules.values().filter(|m| m.is_active()).cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// All registered modules, sorted by name.
    pub async fn get_all_modules(&self) -> Vec<Module> {
        let modules = self.modules.read().await;
        let mut list: Vec<Module> = modules.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Modules in a category, sorted by name.
    pub async fn get_modules_by_category(&self, category: &str) -> Vec<Module> {
        let modules = self.modules.read().await;
        let mut list: Vec<Module> =
            modules.values().filter(|m| m.category == category).cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Module counts grouped by status, for status reporting.
    pub async fn status_counts(&self) -> HashMap<ModuleStatus, usize> {
        let modules = self.modules.read().await;
        let mut counts: HashMap<ModuleStatus, usize> = HashMap::new();
        for m in modules.values() {
            *counts.entry(m.status).or_default() += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(code: &str, name: &str, deps: &[&str]) -> ModuleDefinition {
        ModuleDefinition {
            code: code.into(),
            name: name.into(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_missing_fields() {
        let reg = ModuleRegistry::new();
        reg.register(def("crm", "CRM", &[])).await.unwrap();
        assert!(matches!(
            reg.register(def("crm", "CRM again", &[])).await,
            Err(RegistryError::DuplicateModule(_))
        ));
        assert!(matches!(
            reg.register(def("", "Nameless", &[])).await,
            Err(RegistryError::MissingField(_))
        ));
        assert!(matches!(
            reg.register(def("x", "", &[])).await,
            Err(RegistryError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn activation_is_dependency_gated() {
        let reg = ModuleRegistry::new();
        reg.register(def("inventory", "Inventory", &["auth"])).await.unwrap();

        // auth was never registered
        match reg.activate("inventory").await {
            Err(RegistryError::Dependency { missing, inactive }) => {
                assert_eq!(missing, vec!["auth".to_string()]);
                assert!(inactive.is_empty());
            }
            other => panic!("expected dependency error, got {other:?}"),
        }

        // registered but inactive
        reg.register(def("auth", "Auth", &[])).await.unwrap();
        match reg.activate("inventory").await {
            Err(RegistryError::Dependency { missing, inactive }) => {
                assert!(missing.is_empty());
                assert_eq!(inactive, vec!["auth".to_string()]);
            }
            other => panic!("expected dependency error, got {other:?}"),
        }

        reg.activate("auth").await.unwrap();
        let m = reg.activate("inventory").await.unwrap();
        assert_eq!(m.status, ModuleStatus::Active);
        assert!(m.last_activated_at.is_some());
    }

    #[tokio::test]
    async fn deactivation_is_dependent_gated() {
        let reg = ModuleRegistry::new();
        reg.register(def("auth", "Auth", &[])).await.unwrap();
        reg.register(def("inventory", "Inventory", &["auth"])).await.unwrap();
        reg.activate("auth").await.unwrap();
        reg.activate("inventory").await.unwrap();

        match reg.deactivate("auth").await {
            Err(RegistryError::DependentModules { dependents }) => {
                assert_eq!(dependents, vec!["inventory".to_string()]);
            }
            other => panic!("expected dependents error, got {other:?}"),
        }

        reg.deactivate("inventory").await.unwrap();
        let m = reg.deactivate("auth").await.unwrap();
        assert_eq!(m.status, ModuleStatus::Inactive);
        assert!(!reg.is_active("auth").await);
    }

    #[tokio::test]
    async fn queries_sort_by_name() {
        let reg = ModuleRegistry::new();
        reg.register(def("b", "Zeta", &[])).await.unwrap();
        reg.register(def("a", "Alpha", &[])).await.unwrap();
        let names: Vec<String> = reg.get_all_modules().await.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Alpha".to_string(), "Zeta".to_string()]);
    }

    #[tokio::test]
    async fn side_transitions_are_ungated() {
        let reg = ModuleRegistry::new();
        reg.register(def("crm", "CRM", &[])).await.unwrap();
        reg.activate("crm").await.unwrap();
        let m = reg.set_status("crm", ModuleStatus::Maintenance).await.unwrap();
        assert_eq!(m.status, ModuleStatus::Maintenance);
        assert!(!reg.is_active("crm").await);
        assert!(matches!(
            reg.set_status("ghost", ModuleStatus::Trial).await,
            Err(RegistryError::ModuleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn unregister_requires_inactive_and_no_dependents() {
        let reg = ModuleRegistry::new();
        reg.register(def("auth", "Auth", &[])).await.unwrap();
        reg.register(def("crm", "CRM", &["auth"])).await.unwrap();
        reg.activate("auth").await.unwrap();
        reg.activate("crm").await.unwrap();

        assert!(matches!(reg.unregister("auth").await, Err(RegistryError::DependentModules { .. })));
        assert!(matches!(reg.unregister("crm").await, Err(RegistryError::ModuleActive(_))));
        reg.deactivate("crm").await.unwrap();
        reg.unregister("crm").await.unwrap();
        assert!(reg.get("crm").await.is_none());
    }
}
