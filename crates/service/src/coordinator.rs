use std::collections::HashMap;
use std::sync::Arc;

use models::module::{Module, ModuleDefinition, ModuleStatus};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::{DistributedCache, PermissionCacheService};
use crate::loader::{LoadAllReport, LoadReport, LoaderError, ModuleLoader, ModuleManifest};
use crate::module_config::ModuleConfigManager;
use crate::permissions::{MenuSection, PermissionManager};
use crate::registry::{ModuleRegistry, RegistryError};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
}

impl CoordinatorError {
    pub fn code(&self) -> u16 {
        match self {
            CoordinatorError::Registry(e) => e.code(),
            CoordinatorError::Loader(e) => e.code(),
        }
    }
}

/// Snapshot for the administrative status endpoint.
#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub modules_total: usize,
    pub modules_by_status: HashMap<String, usize>,
    pub active_modules: Vec<String>,
    pub components_by_kind: HashMap<String, usize>,
    pub cache_healthy: bool,
}

/// Composition root: owns startup/shutdown ordering and the module-toggle
/// and menu-generation entry points.
///
/// Mutating operations on one module code (activate/load, deactivate/unload,
/// direct status changes) are serialized through a per-code mutex so that
/// interleaved calls cannot leave the loader catalogs inconsistent.
pub struct Coordinator {
    registry: Arc<ModuleRegistry>,
    loader: Arc<ModuleLoader>,
    permissions: Arc<PermissionManager>,
    module_config: Arc<ModuleConfigManager>,
    cache: Arc<PermissionCacheService>,
    module_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Coordinator {
    /// Wire the whole core together around one distributed cache backend.
    pub fn bootstrap(backend: Arc<dyn DistributedCache>, cfg: &configs::CacheConfig) -> Arc<Self> {
        let cache = Arc::new(PermissionCacheService::new(backend));
        let registry = Arc::new(ModuleRegistry::new());
        let loader = Arc::new(ModuleLoader::new(Arc::clone(&registry)));
        let permissions = Arc::new(PermissionManager::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            cfg,
        ));
        Arc::new(Self {
            registry,
            loader,
            permissions,
            module_config: Arc::new(ModuleConfigManager::new()),
            cache,
            module_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn loader(&self) -> &Arc<ModuleLoader> {
        &self.loader
    }

    pub fn permissions(&self) -> &Arc<PermissionManager> {
        &self.permissions
    }

    pub fn module_config(&self) -> &Arc<ModuleConfigManager> {
        &self.module_config
    }

    pub fn cache(&self) -> &Arc<PermissionCacheService> {
        &self.cache
    }

    async fn lock_for(&self, code: &str) -> Arc<Mutex<()>> {
        let mut locks = self.module_locks.lock().await;
        locks.entry(code.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Load every ACTIVE module; called once at process start.
    #[instrument(skip(self))]
    pub async fn startup(&self) -> LoadAllReport {
        let report = self.loader.load_all_active().await;
        info!(
            loaded = report.reports.len(),
            failed = report.failed.len(),
            "coordinator startup complete"
        );
        for failure in &report.failed {
            warn!(code = %failure.module_code, reason = %failure.reason, "module failed to load at startup");
        }
        report
    }

    /// Unload everything; called once at process shutdown.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        for module in self.registry.get_all_modules().await {
            self.loader.unload(&module.code).await;
        }
        info!("coordinator shutdown complete");
    }

    /// Register a module and, when supplied, its component manifest.
    pub async fn register_module(
        &self,
        definition: ModuleDefinition,
        manifest: Option<ModuleManifest>,
    ) -> Result<Module, RegistryError> {
        let module = self.registry.register(definition).await?;
        if let Some(manifest) = manifest {
            self.loader.register_manifest(manifest).await;
        }
        Ok(module)
    }

    /// Activate a module (dependency-gated) and load its components. Menus
    /// are invalidated for everyone since a new module may now appear.
    #[instrument(skip(self))]
    pub async fn enable_module(&self, code: &str) -> Result<LoadReport, CoordinatorError> {
        let lock = self.lock_for(code).await;
        let _guard = lock.lock().await;

        self.registry.activate(code).await?;
        let report = self.loader.load(code).await?;
        self.permissions.invalidate_menus().await;
        info!(%code, "module_enabled");
        Ok(report)
    }

    /// Deactivate a module (dependent-gated) and tear its components down.
    #[instrument(skip(self))]
    pub async fn disable_module(&self, code: &str) -> Result<Module, CoordinatorError> {
        let lock = self.lock_for(code).await;
        let _guard = lock.lock().await;

        let module = self.registry.deactivate(code).await?;
        self.loader.unload(code).await;
        self.permissions.invalidate_menus().await;
        info!(%code, "module_disabled");
        Ok(module)
    }

    /// Direct status transition (MAINTENANCE/TRIAL/EXPIRED are ungated).
    /// Leaving ACTIVE always tears the module's components down.
    #[instrument(skip(self))]
    pub async fn set_module_status(
        &self,
        code: &str,
        status: ModuleStatus,
    ) -> Result<Module, CoordinatorError> {
        let lock = self.lock_for(code).await;
        let _guard = lock.lock().await;

        let was_active = self.registry.is_active(code).await;
        let module = self.registry.set_status(code, status).await?;
        if was_active && status != ModuleStatus::Active {
            self.loader.unload(code).await;
            self.permissions.invalidate_menus().await;
        }
        Ok(module)
    }

    /// Menu-generation entry point.
    pub async fn user_menu(&self, user_id: Uuid) -> Arc<Vec<MenuSection>> {
        self.permissions.generate_user_menu(user_id).await
    }

    /// Snapshot of module, component and cache health for administration.
    pub async fn system_status(&self) -> SystemStatus {
        let all = self.registry.get_all_modules().await;
        let by_status = self
            .registry
            .status_counts()
            .await
            .into_iter()
            .map(|(status, count)| (status.to_string(), count))
            .collect();
        let active_modules = self
            .registry
            .get_active_modules()
            .await
            .into_iter()
            .map(|m| m.code)
            .collect();
        let components_by_kind = self
            .loader
            .component_counts()
            .into_iter()
            .map(|(kind, count)| (kind.to_string(), count))
            .collect();
        SystemStatus {
            modules_total: all.len(),
            modules_by_status: by_status,
            active_modules,
            components_by_kind,
            cache_healthy: self.cache.is_healthy().await,
        }
    }
}
