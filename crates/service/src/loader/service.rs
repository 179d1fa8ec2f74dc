use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use models::component::{component_key, module_key_prefix, ComponentKind, LoadedComponent};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::errors::LoaderError;
use super::manifest::{HandlerRef, ModuleManifest, ServiceDeps, ServiceFactory, ServiceInstance};
use crate::registry::ModuleRegistry;

/// Route component mounted under the module's API prefix.
#[derive(Clone)]
pub struct MountedRoute {
    pub mount_prefix: String,
    pub route_path: String,
    pub handler: HandlerRef,
}

/// Per-component load failure; the rest of the load continues.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentError {
    pub kind: ComponentKind,
    pub name: String,
    pub reason: String,
}

/// Outcome of loading one module: what was materialized and what failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub module_code: String,
    pub loaded: Vec<LoadedComponent>,
    pub errors: Vec<ComponentError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleLoadFailure {
    pub module_code: String,
    pub reason: String,
}

/// Outcome of loading every ACTIVE module; one module failing does not block
/// the others.
#[derive(Debug, Default, Serialize)]
pub struct LoadAllReport {
    pub reports: Vec<LoadReport>,
    pub failed: Vec<ModuleLoadFailure>,
}

/// Materializes module components into catalogs keyed
/// `<module_code>.<component_name>` and owns memoized service instances.
pub struct ModuleLoader {
    registry: Arc<ModuleRegistry>,
    manifests: RwLock<HashMap<String, Arc<ModuleManifest>>>,
    components: DashMap<String, LoadedComponent>,
    routes: DashMap<String, MountedRoute>,
    // resolution state: purged on unload so a later load sees fresh definitions
    service_factories: DashMap<String, ServiceFactory>,
    service_instances: DashMap<String, ServiceInstance>,
    middleware: DashMap<String, HandlerRef>,
}

impl ModuleLoader {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            manifests: RwLock::new(HashMap::new()),
            components: DashMap::new(),
            routes: DashMap::new(),
            service_factories: DashMap::new(),
            service_instances: DashMap::new(),
            middleware: DashMap::new(),
        }
    }

    /// Register (or replace) a module's component manifest. Modules call this
    /// at their own initialization, before the module is first loaded.
    pub async fn register_manifest(&self, manifest: ModuleManifest) {
        let code = manifest.module_code.clone();
        self.manifests.write().await.insert(code.clone(), Arc::new(manifest));
        debug!(%code, "manifest_registered");
    }

    /// Load an ACTIVE module's components. Per-component failures are
    /// collected into the report without aborting the rest (best-effort).
    #[instrument(skip(self))]
    pub async fn load(&self, code: &str) -> Result<LoadReport, LoaderError> {
        let module = self
            .registry
            .get(code)
            .await
            .ok_or_else(|| LoaderError::ModuleNotFound(code.into()))?;
        if !module.is_active() {
            return Err(LoaderError::ModuleInactive { code: code.into(), status: module.status });
        }

        let mut report = LoadReport { module_code: code.to_string(), ..Default::default() };
        let manifest = match self.manifests.read().await.get(code).cloned() {
            Some(m) => m,
            None => {
                debug!(%code, "no manifest registered; nothing to load");
                return Ok(report);
            }
        };

        for name in &manifest.models {
            self.materialize(&mut report, code, ComponentKind::Model, name, |_| {});
        }
        for spec in &manifest.services {
            let factory = spec.factory.clone();
            self.materialize(&mut report, code, ComponentKind::Service, &spec.name, |key| {
                self.service_factories.insert(key.to_string(), factory);
            });
        }
        let mount_prefix = module.mount_prefix();
        for spec in &manifest.routes {
            let route = MountedRoute {
                mount_prefix: mount_prefix.clone(),
                route_path: spec.path.clone(),
                handler: spec.handler.clone(),
            };
            self.materialize(&mut report, code, ComponentKind::Route, &spec.name, |key| {
                self.routes.insert(key.to_string(), route);
            });
        }
        for spec in &manifest.middleware {
            let handler = spec.handler.clone();
            self.materialize(&mut report, code, ComponentKind::Middleware, &spec.name, |key| {
                self.middleware.insert(key.to_string(), handler);
            });
        }

        info!(
            %code,
            loaded = report.loaded.len(),
            errors = report.errors.len(),
            "module_loaded"
        );
        Ok(report)
    }

    /// Insert one component into the shared catalog, recording a
    /// [`ComponentError`] instead of failing the whole load.
    fn materialize<F: FnOnce(&str)>(
        &self,
        report: &mut LoadReport,
        code: &str,
        kind: ComponentKind,
        name: &str,
        commit: F,
    ) {
        if name.trim().is_empty() {
            report.errors.push(ComponentError {
                kind,
                name: name.to_string(),
                reason: "component name must not be empty".into(),
            });
            return;
        }
        let key = component_key(code, name);
        if self.components.contains_key(&key) {
            report.errors.push(ComponentError {
                kind,
                name: name.to_string(),
                reason: format!("component already loaded: {key}"),
            });
            return;
        }
        commit(&key);
        let component = LoadedComponent { module_code: code.to_string(), kind, name: name.to_string() };
        self.components.insert(key, component.clone());
        report.loaded.push(component);
    }

    /// Tear down everything a module loaded: catalog entries, memoized
    /// service instances and cached factories. Idempotent.
    #[instrument(skip(self))]
    pub async fn unload(&self, code: &str) {
        let prefix = module_key_prefix(code);
        let before = self.components.len();
        self.components.retain(|k, _| !k.starts_with(&prefix));
        self.routes.retain(|k, _| !k.starts_with(&prefix));
        self.service_factories.retain(|k, _| !k.starts_with(&prefix));
        self.service_instances.retain(|k, _| !k.starts_with(&prefix));
        self.middleware.retain(|k, _| !k.starts_with(&prefix));
        let removed = before - self.components.len();
        if removed > 0 {
            info!(%code, removed, "module_unloaded");
        } else {
            debug!(%code, "unload was a no-op");
        }
    }

    /// Lazy singleton per service key. The first call constructs and caches;
    /// later calls return the cached instance and ignore `deps`.
    pub fn get_service_instance(
        &self,
        key: &str,
        deps: &ServiceDeps,
    ) -> Result<ServiceInstance, LoaderError> {
        if let Some(instance) = self.service_instances.get(key) {
            return Ok(instance.clone());
        }
        let factory = self
            .service_factories
            .get(key)
            .map(|f| f.clone())
            .ok_or_else(|| LoaderError::ServiceNotFound(key.into()))?;
        let instance = factory(deps)
            .map_err(|reason| LoaderError::Construction { key: key.into(), reason })?;
        // concurrent first calls may race; first writer wins
        let stored = self.service_instances.entry(key.to_string()).or_insert(instance);
        Ok(stored.clone())
    }

    /// Load every currently ACTIVE module; per-module failures are captured
    /// in the report and do not block the others.
    #[instrument(skip(self))]
    pub async fn load_all_active(&self) -> LoadAllReport {
        let mut summary = LoadAllReport::default();
        for module in self.registry.get_active_modules().await {
            match self.load(&module.code).await {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    warn!(code = %module.code, error = %e, "module load failed");
                    summary.failed.push(ModuleLoadFailure {
                        module_code: module.code,
                        reason: e.to_string(),
                    });
                }
            }
        }
        summary
    }

    /// Catalog entries currently owned by a module.
    pub fn loaded_components(&self, code: &str) -> Vec<LoadedComponent> {
        let prefix = module_key_prefix(code);
        let mut list: Vec<LoadedComponent> = self
            .components
            .iter()
            .filter(|e| e.key().starts_with(&prefix))
            .map(|e| e.value().clone())
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub fn is_loaded(&self, code: &str) -> bool {
        let prefix = module_key_prefix(code);
        self.components.iter().any(|e| e.key().starts_with(&prefix))
    }

    /// Mounted route catalog entries of a module.
    pub fn mounted_routes(&self, code: &str) -> Vec<MountedRoute> {
        let prefix = module_key_prefix(code);
        self.routes
            .iter()
            .filter(|e| e.key().starts_with(&prefix))
            .map(|e| e.value().clone())
            .collect()
    }

    /// Loaded component counts grouped by kind, for status reporting.
    pub fn component_counts(&self) -> HashMap<ComponentKind, usize> {
        let mut counts: HashMap<ComponentKind, usize> = HashMap::new();
        for entry in self.components.iter() {
            *counts.entry(entry.value().kind).or_default() += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::module::ModuleDefinition;

    async fn active_registry(code: &str) -> Arc<ModuleRegistry> {
        let reg = Arc::new(ModuleRegistry::new());
        reg.register(ModuleDefinition {
            code: code.into(),
            name: code.to_uppercase(),
            ..Default::default()
        })
        .await
        .unwrap();
        reg.activate(code).await.unwrap();
        reg
    }

    fn noop_handler() -> HandlerRef {
        Arc::new(|v| v)
    }

    fn manifest(code: &str) -> ModuleManifest {
        ModuleManifest::new(code)
            .with_model("Urun")
            .with_service("UrunService", Arc::new(|_deps| Ok(Arc::new(42u32) as ServiceInstance)))
            .with_route("list", "/urunler", noop_handler())
            .with_middleware("audit", noop_handler())
    }

    #[tokio::test]
    async fn load_requires_active_module() {
        let reg = Arc::new(ModuleRegistry::new());
        let loader = ModuleLoader::new(reg.clone());
        assert!(matches!(loader.load("stok").await, Err(LoaderError::ModuleNotFound(_))));

        reg.register(ModuleDefinition { code: "stok".into(), name: "Stok".into(), ..Default::default() })
            .await
            .unwrap();
        assert!(matches!(loader.load("stok").await, Err(LoaderError::ModuleInactive { .. })));
    }

    #[tokio::test]
    async fn load_materializes_all_component_kinds() {
        let reg = active_registry("stok").await;
        let loader = ModuleLoader::new(reg);
        loader.register_manifest(manifest("stok")).await;

        let report = loader.load("stok").await.unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(report.loaded.len(), 4);
        assert!(loader.is_loaded("stok"));

        let routes = loader.mounted_routes("stok");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].mount_prefix, "/api/stok");
        assert_eq!(routes[0].route_path, "/urunler");

        let counts = loader.component_counts();
        assert_eq!(counts[&ComponentKind::Model], 1);
        assert_eq!(counts[&ComponentKind::Service], 1);
    }

    #[tokio::test]
    async fn component_failures_are_isolated() {
        let reg = active_registry("stok").await;
        let loader = ModuleLoader::new(reg);
        loader
            .register_manifest(
                ModuleManifest::new("stok")
                    .with_model("")
                    .with_model("Urun")
                    .with_model("Urun"),
            )
            .await;

        let report = loader.load("stok").await.unwrap();
        assert_eq!(report.loaded.len(), 1);
        assert_eq!(report.errors.len(), 2);
    }

    #[tokio::test]
    async fn unload_is_idempotent_and_purges_resolution_state() {
        let reg = active_registry("stok").await;
        let loader = ModuleLoader::new(reg);
        loader.register_manifest(manifest("stok")).await;
        loader.load("stok").await.unwrap();

        let deps = ServiceDeps::new();
        loader.get_service_instance("stok.UrunService", &deps).unwrap();

        loader.unload("stok").await;
        assert!(!loader.is_loaded("stok"));
        assert!(matches!(
            loader.get_service_instance("stok.UrunService", &deps),
            Err(LoaderError::ServiceNotFound(_))
        ));

        // second unload changes nothing
        loader.unload("stok").await;
        assert!(!loader.is_loaded("stok"));
        assert!(loader.mounted_routes("stok").is_empty());

        // a fresh load sees fresh definitions
        let report = loader.load("stok").await.unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(report.loaded.len(), 4);
    }

    #[tokio::test]
    async fn service_instances_are_memoized_per_key() {
        let reg = active_registry("stok").await;
        let loader = ModuleLoader::new(reg);
        loader.register_manifest(manifest("stok")).await;
        loader.load("stok").await.unwrap();

        let deps = ServiceDeps::new();
        let a = loader.get_service_instance("stok.UrunService", &deps).unwrap();
        let b = loader.get_service_instance("stok.UrunService", &deps).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let value = a.downcast::<u32>().ok().unwrap();
        assert_eq!(*value, 42);
    }

    #[tokio::test]
    async fn failing_factory_reports_construction_error() {
        let reg = active_registry("stok").await;
        let loader = ModuleLoader::new(reg);
        loader
            .register_manifest(ModuleManifest::new("stok").with_service(
                "Broken",
                Arc::new(|_deps| Err("missing upstream".to_string())),
            ))
            .await;
        loader.load("stok").await.unwrap();

        match loader.get_service_instance("stok.Broken", &ServiceDeps::new()) {
            Err(LoaderError::Construction { key, reason }) => {
                assert_eq!(key, "stok.Broken");
                assert_eq!(reason, "missing upstream");
            }
            Err(other) => panic!("expected construction error, got {other:?}"),
            Ok(_) => panic!("expected construction error, got an instance"),
        }
    }

    #[tokio::test]
    async fn load_all_active_captures_per_module_failures() {
        let reg = Arc::new(ModuleRegistry::new());
        for code in ["a", "b"] {
            reg.register(ModuleDefinition {
                code: code.into(),
                name: code.to_uppercase(),
                ..Default::default()
            })
            .await
            .unwrap();
            reg.activate(code).await.unwrap();
        }
        let loader = ModuleLoader::new(reg.clone());
        loader.register_manifest(ModuleManifest::new("a").with_model("M")).await;

        let summary = loader.load_all_active().await;
        assert_eq!(summary.reports.len(), 2);
        assert!(summary.failed.is_empty());
        assert!(loader.is_loaded("a"));
    }
}
