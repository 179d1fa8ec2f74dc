//! End-to-end module lifecycle: registration, dependency-gated toggling and
//! component load/unload through the coordinator.

use std::sync::Arc;

use models::module::{ModuleDefinition, ModuleStatus};
use service::cache::backend::memory::InMemoryCache;
use service::coordinator::{Coordinator, CoordinatorError};
use service::loader::{ModuleManifest, ServiceInstance};
use service::registry::RegistryError;

fn coordinator() -> Arc<Coordinator> {
    Coordinator::bootstrap(Arc::new(InMemoryCache::new()), &configs::CacheConfig::default())
}

fn def(code: &str, name: &str, deps: &[&str]) -> ModuleDefinition {
    ModuleDefinition {
        code: code.into(),
        name: name.into(),
        dependencies: deps.iter().map(|d| d.to_string()).collect(),
        ..Default::default()
    }
}

fn inventory_manifest() -> ModuleManifest {
    ModuleManifest::new("inventory")
        .with_model("Urun")
        .with_service("UrunService", Arc::new(|_deps| Ok(Arc::new("urun") as ServiceInstance)))
        .with_route("list", "/urunler", Arc::new(|v| v))
}

#[tokio::test]
async fn activation_order_follows_the_dependency_graph() {
    let coord = coordinator();
    coord.register_module(def("inventory", "Inventory", &["auth"]), None).await.unwrap();

    // AUTH is not even registered yet
    match coord.enable_module("inventory").await {
        Err(CoordinatorError::Registry(RegistryError::Dependency { missing, inactive })) => {
            assert_eq!(missing, vec!["auth".to_string()]);
            assert!(inactive.is_empty());
        }
        other => panic!("expected dependency error, got {other:?}"),
    }

    coord.register_module(def("auth", "Auth", &[]), None).await.unwrap();
    coord.enable_module("auth").await.unwrap();
    coord.enable_module("inventory").await.unwrap();

    let module = coord.registry().get("inventory").await.unwrap();
    assert_eq!(module.status, ModuleStatus::Active);
}

#[tokio::test]
async fn deactivation_is_blocked_by_active_dependents() {
    let coord = coordinator();
    coord.register_module(def("auth", "Auth", &[]), None).await.unwrap();
    coord.register_module(def("inventory", "Inventory", &["auth"]), None).await.unwrap();
    coord.enable_module("auth").await.unwrap();
    coord.enable_module("inventory").await.unwrap();

    match coord.disable_module("auth").await {
        Err(CoordinatorError::Registry(RegistryError::DependentModules { dependents })) => {
            assert_eq!(dependents, vec!["inventory".to_string()]);
        }
        other => panic!("expected dependents error, got {other:?}"),
    }

    coord.disable_module("inventory").await.unwrap();
    coord.disable_module("auth").await.unwrap();
    assert!(!coord.registry().is_active("auth").await);
}

#[tokio::test]
async fn enable_loads_and_disable_unloads_components() {
    let coord = coordinator();
    coord
        .register_module(def("inventory", "Inventory", &[]), Some(inventory_manifest()))
        .await
        .unwrap();

    let report = coord.enable_module("inventory").await.unwrap();
    assert!(report.errors.is_empty());
    assert_eq!(report.loaded.len(), 3);
    assert!(coord.loader().is_loaded("inventory"));

    let routes = coord.loader().mounted_routes("inventory");
    assert_eq!(routes[0].mount_prefix, "/api/inventory");

    coord.disable_module("inventory").await.unwrap();
    assert!(!coord.loader().is_loaded("inventory"));

    // unloading an already-unloaded module leaves the catalogs unchanged
    coord.loader().unload("inventory").await;
    assert!(!coord.loader().is_loaded("inventory"));
    assert!(coord.loader().component_counts().is_empty());
}

#[tokio::test]
async fn leaving_active_through_set_status_unloads() {
    let coord = coordinator();
    coord
        .register_module(def("inventory", "Inventory", &[]), Some(inventory_manifest()))
        .await
        .unwrap();
    coord.enable_module("inventory").await.unwrap();
    assert!(coord.loader().is_loaded("inventory"));

    coord.set_module_status("inventory", ModuleStatus::Maintenance).await.unwrap();
    assert!(!coord.loader().is_loaded("inventory"));
    let module = coord.registry().get("inventory").await.unwrap();
    assert_eq!(module.status, ModuleStatus::Maintenance);
}

#[tokio::test]
async fn startup_loads_every_active_module() {
    let coord = coordinator();
    coord
        .register_module(def("inventory", "Inventory", &[]), Some(inventory_manifest()))
        .await
        .unwrap();
    coord.register_module(def("crm", "CRM", &[]), None).await.unwrap();
    coord.registry().activate("inventory").await.unwrap();
    coord.registry().activate("crm").await.unwrap();

    let report = coord.startup().await;
    assert_eq!(report.reports.len(), 2);
    assert!(report.failed.is_empty());
    assert!(coord.loader().is_loaded("inventory"));

    coord.shutdown().await;
    assert!(!coord.loader().is_loaded("inventory"));
}

#[tokio::test]
async fn system_status_reflects_modules_and_components() {
    let coord = coordinator();
    coord
        .register_module(def("inventory", "Inventory", &[]), Some(inventory_manifest()))
        .await
        .unwrap();
    coord.register_module(def("crm", "CRM", &[]), None).await.unwrap();
    coord.enable_module("inventory").await.unwrap();

    let status = coord.system_status().await;
    assert_eq!(status.modules_total, 2);
    assert_eq!(status.modules_by_status["ACTIVE"], 1);
    assert_eq!(status.modules_by_status["INACTIVE"], 1);
    assert_eq!(status.active_modules, vec!["inventory".to_string()]);
    assert_eq!(status.components_by_kind["service"], 1);
    assert!(status.cache_healthy);
}
