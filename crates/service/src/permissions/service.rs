use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use models::menu::MenuItem;
use models::permission::RoleGrant;
use moka::future::Cache;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::codes;
use super::menu::{build_sections, MenuSection};
use crate::cache::{keys, PermissionCacheService};
use crate::registry::ModuleRegistry;

/// Resolves an actor's effective permission set (direct ∪ role-derived)
/// through a two-tier cache, answers module/page/action/data-level checks and
/// builds the navigation menu.
///
/// Resolution is pure and idempotent, so concurrent cache misses racing to
/// write the same answer are harmless (last writer wins).
pub struct PermissionManager {
    registry: Arc<ModuleRegistry>,
    cache: Arc<PermissionCacheService>,
    direct: RwLock<HashMap<Uuid, HashSet<String>>>,
    user_roles: RwLock<HashMap<Uuid, HashSet<String>>>,
    // shared role -> permission-set mapping, merged across users
    role_permissions: RwLock<HashMap<String, HashSet<String>>>,
    local_permissions: Cache<Uuid, Arc<HashSet<String>>>,
    local_menus: Cache<Uuid, Arc<Vec<MenuSection>>>,
    point_checks: DashMap<(Uuid, String), (bool, Instant)>,
    permission_ttl: Duration,
    menu_ttl: Duration,
    point_check_ttl: Duration,
}

impl PermissionManager {
    pub fn new(
        registry: Arc<ModuleRegistry>,
        cache: Arc<PermissionCacheService>,
        cfg: &configs::CacheConfig,
    ) -> Self {
        let permission_ttl = Duration::from_secs(cfg.permission_ttl_secs);
        let menu_ttl = Duration::from_secs(cfg.menu_ttl_secs);
        Self {
            registry,
            cache,
            direct: RwLock::new(HashMap::new()),
            user_roles: RwLock::new(HashMap::new()),
            role_permissions: RwLock::new(HashMap::new()),
            local_permissions: Cache::builder()
                .max_capacity(cfg.local_capacity)
                .time_to_live(permission_ttl)
                .build(),
            local_menus: Cache::builder()
                .max_capacity(cfg.local_capacity)
                .time_to_live(menu_ttl)
                .build(),
            point_checks: DashMap::new(),
            permission_ttl,
            menu_ttl,
            point_check_ttl: Duration::from_secs(cfg.point_check_ttl_secs),
        }
    }

    /// Replace the actor's direct permissions and role assignments, merge the
    /// roles' permissions into the shared role map, and drop every cached
    /// answer derived from the old inputs.
    #[instrument(skip(self, permissions, roles), fields(user_id = %user_id))]
    pub async fn load_user_permissions(
        &self,
        user_id: Uuid,
        permissions: Vec<String>,
        roles: Vec<RoleGrant>,
    ) {
        {
            let mut direct = self.direct.write().await;
            direct.insert(user_id, permissions.into_iter().collect());
        }
        {
            let mut user_roles = self.user_roles.write().await;
            user_roles.insert(user_id, roles.iter().map(|r| r.id.clone()).collect());
        }
        {
            let mut role_permissions = self.role_permissions.write().await;
            for role in roles {
                role_permissions
                    .entry(role.id)
                    .or_default()
                    .extend(role.permissions);
            }
        }
        self.clear_user_cache(user_id).await;
        info!(%user_id, "user_permissions_loaded");
    }

    /// Union of the actor's direct permissions and all role permissions,
    /// computed from the live maps (bypassing the caches).
    async fn resolve_permissions(&self, user_id: Uuid) -> HashSet<String> {
        let mut effective: HashSet<String> = self
            .direct
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        let user_roles = self.user_roles.read().await;
        if let Some(role_ids) = user_roles.get(&user_id) {
            let role_permissions = self.role_permissions.read().await;
            for role_id in role_ids {
                if let Some(perms) = role_permissions.get(role_id) {
                    effective.extend(perms.iter().cloned());
                }
            }
        }
        effective
    }

    /// Effective permission set: local cache, then distributed cache, then
    /// recomputation populating both tiers.
    pub async fn get_user_all_permissions(&self, user_id: Uuid) -> Arc<HashSet<String>> {
        if let Some(cached) = self.local_permissions.get(&user_id).await {
            return cached;
        }

        let key = keys::user_permissions(user_id);
        if let Some(list) = self.cache.get_json::<Vec<String>>(&key).await {
            let set = Arc::new(list.into_iter().collect::<HashSet<String>>());
            self.local_permissions.insert(user_id, set.clone()).await;
            debug!(%user_id, "permission set served from distributed tier");
            return set;
        }

        let set = Arc::new(self.resolve_permissions(user_id).await);
        self.local_permissions.insert(user_id, set.clone()).await;
        let mut list: Vec<&String> = set.iter().collect();
        list.sort();
        self.cache.set_json(&key, &list, Some(self.permission_ttl)).await;
        set
    }

    /// Membership check with a short-TTL point cache keyed (user, permission).
    pub async fn has_permission(&self, user_id: Uuid, permission: &str) -> bool {
        let point_key = (user_id, permission.to_string());
        if let Some(entry) = self.point_checks.get(&point_key) {
            let (granted, expires_at) = *entry;
            if Instant::now() < expires_at {
                return granted;
            }
        }

        let cache_key = keys::point_check(user_id, permission);
        let granted = match self.cache.get_json::<bool>(&cache_key).await {
            Some(hit) => hit,
            None => {
                let granted = self.get_user_all_permissions(user_id).await.contains(permission);
                self.cache.set_json(&cache_key, &granted, Some(self.point_check_ttl)).await;
                granted
            }
        };
        self.point_checks
            .insert(point_key, (granted, Instant::now() + self.point_check_ttl));
        granted
    }

    /// "Every" over the resolved set.
    pub async fn has_all_permissions(&self, user_id: Uuid, permissions: &[String]) -> bool {
        let set = self.get_user_all_permissions(user_id).await;
        permissions.iter().all(|p| set.contains(p))
    }

    /// "Some" over the resolved set.
    pub async fn has_any_permission(&self, user_id: Uuid, permissions: &[String]) -> bool {
        let set = self.get_user_all_permissions(user_id).await;
        permissions.iter().any(|p| set.contains(p))
    }

    /// Permissions from `permissions` the actor does not hold.
    pub async fn missing_permissions(&self, user_id: Uuid, permissions: &[String]) -> Vec<String> {
        let set = self.get_user_all_permissions(user_id).await;
        permissions.iter().filter(|p| !set.contains(*p)).cloned().collect()
    }

    /// Module-level access. Fails closed: unknown or non-ACTIVE modules deny.
    /// Modules declaring required permissions grant on any of them; otherwise
    /// the synthesized `module.<code>.access` permission decides.
    pub async fn has_module_access(&self, user_id: Uuid, module_code: &str) -> bool {
        let module = match self.registry.get(module_code).await {
            Some(m) => m,
            None => return false,
        };
        if !module.is_active() {
            return false;
        }
        if !module.permissions.is_empty() {
            return self.has_any_permission(user_id, &module.permissions).await;
        }
        self.has_permission(user_id, &codes::module_access(module_code)).await
    }

    /// Page access: module access plus `<module>.<page>.view`.
    pub async fn has_page_access(&self, user_id: Uuid, module_code: &str, page: &str) -> bool {
        self.has_module_access(user_id, module_code).await
            && self.has_permission(user_id, &codes::page_view(module_code, page)).await
    }

    /// Action permission: module access plus `<module>.<resource>.<action>`.
    pub async fn has_action_permission(
        &self,
        user_id: Uuid,
        module_code: &str,
        resource: &str,
        action: &str,
    ) -> bool {
        self.has_module_access(user_id, module_code).await
            && self.has_permission(user_id, &codes::action(module_code, resource, action)).await
    }

    /// Data-level access: module access plus `<module>.data.<level>`.
    pub async fn has_data_level_access(
        &self,
        user_id: Uuid,
        module_code: &str,
        level: &str,
    ) -> bool {
        self.has_module_access(user_id, module_code).await
            && self.has_permission(user_id, &codes::data_level(module_code, level)).await
    }

    /// Build (or serve from cache) the actor's navigation menu. A module
    /// survives only when module access passes and at least one of its menu
    /// items passes its own permission check.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn generate_user_menu(&self, user_id: Uuid) -> Arc<Vec<MenuSection>> {
        if let Some(cached) = self.local_menus.get(&user_id).await {
            return cached;
        }
        let key = keys::user_menu(user_id);
        if let Some(menu) = self.cache.get_json::<Vec<MenuSection>>(&key).await {
            let menu = Arc::new(menu);
            self.local_menus.insert(user_id, menu.clone()).await;
            return menu;
        }

        let mut survivors = Vec::new();
        for module in self.registry.get_active_modules().await {
            if !self.has_module_access(user_id, &module.code).await {
                continue;
            }
            let mut visible: Vec<MenuItem> = Vec::new();
            for item in &module.menu_items {
                let allowed = match &item.permission {
                    None => true,
                    Some(p) => self.has_permission(user_id, p).await,
                };
                if allowed {
                    visible.push(item.clone());
                }
            }
            if visible.is_empty() {
                continue;
            }
            survivors.push((module, visible));
        }

        let menu = Arc::new(build_sections(survivors));
        self.local_menus.insert(user_id, menu.clone()).await;
        self.cache.set_json(&key, menu.as_ref(), Some(self.menu_ttl)).await;
        menu
    }

    /// Drop every cached answer for one user: local tiers plus best-effort
    /// distributed keys. Called whenever the user's grants change.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_user_cache(&self, user_id: Uuid) {
        self.local_permissions.invalidate(&user_id).await;
        self.local_menus.invalidate(&user_id).await;
        self.point_checks.retain(|(uid, _), _| *uid != user_id);

        self.cache.delete(&keys::user_permissions(user_id)).await;
        self.cache.delete(&keys::user_menu(user_id)).await;
        self.cache.delete_by_prefix(&keys::point_check_prefix(user_id)).await;
    }

    /// Global variant of [`Self::clear_user_cache`]; used on bulk permission or
    /// module-topology changes.
    #[instrument(skip(self))]
    pub async fn clear_all_cache(&self) {
        self.local_permissions.invalidate_all();
        self.local_menus.invalidate_all();
        self.point_checks.clear();
        for namespace in [
            keys::USER_PERMISSIONS,
            keys::ROLE_PERMISSIONS,
            keys::MODULE_PERMISSIONS,
            keys::USER_MENU,
            keys::POINT_CHECK,
        ] {
            self.cache.delete_by_prefix(&format!("{namespace}:")).await;
        }
    }

    /// Drop every cached menu; activation and deactivation change what menus
    /// should contain for all users.
    pub async fn invalidate_menus(&self) {
        self.local_menus.invalidate_all();
        self.cache.delete_by_prefix(&format!("{}:", keys::USER_MENU)).await;
    }
}
