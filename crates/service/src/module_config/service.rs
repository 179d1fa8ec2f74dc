use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use super::errors::ConfigError;
use super::validator::ConfigValidator;

/// Notified with (module_code, old_config, new_config) after every applied
/// change.
pub type ChangeListener = Arc<dyn Fn(&str, &Value, &Value) + Send + Sync>;

/// Per-module runtime configuration store.
///
/// Holds a live config and a registered default per module, validates
/// candidates against an optional schema validator, and notifies change
/// listeners after each applied update. Listener failures are logged and
/// never propagated.
#[derive(Default)]
pub struct ModuleConfigManager {
    configs: RwLock<HashMap<String, Value>>,
    defaults: RwLock<HashMap<String, Value>>,
    validators: RwLock<HashMap<String, Arc<ConfigValidator>>>,
    listeners: RwLock<Vec<ChangeListener>>,
}

/// Merge `incoming` into `base`: objects merge recursively, everything else
/// is replaced by the incoming value.
fn deep_merge(base: &mut Value, incoming: Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, incoming) => *base_slot = incoming,
    }
}

/// Resolve a dotted path inside a JSON value; `None` when any segment is
/// missing.
fn get_path<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in dotted.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write a value at a dotted path, creating (or overwriting) intermediate
/// containers as needed.
fn set_path(target: &mut Value, dotted: &str, value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    match dotted.split_once('.') {
        None => {
            if let Some(map) = target.as_object_mut() {
                map.insert(dotted.to_string(), value);
            }
        }
        Some((head, rest)) => {
            if let Some(map) = target.as_object_mut() {
                let slot = map
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                set_path(slot, rest, value);
            }
        }
    }
}

impl ModuleConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a default (and optional validator) for a module. The default
    /// becomes the live config only if none exists yet.
    #[instrument(skip(self, default_config, validator))]
    pub async fn register_module_config(
        &self,
        code: &str,
        default_config: Value,
        validator: Option<ConfigValidator>,
    ) {
        {
            let mut configs = self.configs.write().await;
            configs.entry(code.to_string()).or_insert_with(|| default_config.clone());
        }
        self.defaults.write().await.insert(code.to_string(), default_config);
        if let Some(v) = validator {
            self.validators.write().await.insert(code.to_string(), Arc::new(v));
        }
        info!(%code, "module_config_registered");
    }

    /// Subscribe to config changes across all modules.
    pub async fn on_change(&self, listener: ChangeListener) {
        self.listeners.write().await.push(listener);
    }

    /// Validate and apply a config change. With `merge` the new value is
    /// deep-merged into the current config, otherwise it replaces it. On a
    /// validation failure nothing is stored and the violation list is
    /// returned.
    #[instrument(skip(self, new_config))]
    pub async fn update_module_config(
        &self,
        code: &str,
        new_config: Value,
        merge: bool,
    ) -> Result<Value, ConfigError> {
        let old = {
            let configs = self.configs.read().await;
            configs.get(code).cloned().unwrap_or_else(|| Value::Object(Map::new()))
        };

        let candidate = if merge {
            let mut merged = old.clone();
            deep_merge(&mut merged, new_config);
            merged
        } else {
            new_config
        };

        let validator = self.validators.read().await.get(code).cloned();
        if let Some(validator) = validator {
            let violations = validator.validate(&candidate);
            if !violations.is_empty() {
                return Err(ConfigError::Validation { violations });
            }
        }

        self.configs.write().await.insert(code.to_string(), candidate.clone());
        self.notify(code, &old, &candidate).await;
        info!(%code, merge, "module_config_updated");
        Ok(candidate)
    }

    async fn notify(&self, code: &str, old: &Value, new: &Value) {
        let listeners = self.listeners.read().await;
        for listener in listeners.iter() {
            // a broken listener must not poison the update
            if catch_unwind(AssertUnwindSafe(|| listener(code, old, new))).is_err() {
                error!(%code, "config change listener panicked");
            }
        }
    }

    /// Full copy of a module's config, or the value at a dotted path.
    pub async fn get_module_config(&self, code: &str, dotted_key: Option<&str>) -> Option<Value> {
        let configs = self.configs.read().await;
        let config = configs.get(code)?;
        match dotted_key {
            None => Some(config.clone()),
            Some(path) => get_path(config, path).cloned(),
        }
    }

    /// Write one value at a dotted path (creating intermediate containers)
    /// and apply it as a full replacement through the validation path.
    pub async fn set_module_config_value(
        &self,
        code: &str,
        dotted_key: &str,
        value: Value,
    ) -> Result<Value, ConfigError> {
        let mut current = {
            let configs = self.configs.read().await;
            configs.get(code).cloned().unwrap_or_else(|| Value::Object(Map::new()))
        };
        set_path(&mut current, dotted_key, value);
        self.update_module_config(code, current, false).await
    }

    /// Restore the registered default; fails when none was ever registered.
    #[instrument(skip(self))]
    pub async fn reset_module_config(&self, code: &str) -> Result<Value, ConfigError> {
        let default = {
            let defaults = self.defaults.read().await;
            defaults
                .get(code)
                .cloned()
                .ok_or_else(|| ConfigError::NotRegistered(code.to_string()))?
        };
        self.update_module_config(code, default, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::validator::{create_validator, FieldRule, FieldType};
    use super::*;
    use serde_json::json;
    use std::collections::HashMap as StdHashMap;
    use std::sync::Mutex;

    fn limit_schema() -> ConfigValidator {
        create_validator(StdHashMap::from([(
            "limit".to_string(),
            FieldRule::new().required().of_type(FieldType::Integer).min(1.0).max(100.0),
        )]))
    }

    #[tokio::test]
    async fn register_keeps_existing_live_config() {
        let mgr = ModuleConfigManager::new();
        mgr.register_module_config("stok", json!({"limit": 10}), None).await;
        mgr.update_module_config("stok", json!({"limit": 20}), true).await.unwrap();
        // re-registering must not clobber the live value
        mgr.register_module_config("stok", json!({"limit": 10}), None).await;
        assert_eq!(mgr.get_module_config("stok", Some("limit")).await, Some(json!(20)));
    }

    #[tokio::test]
    async fn invalid_update_is_rejected_and_stored_config_unchanged() {
        let mgr = ModuleConfigManager::new();
        mgr.register_module_config("stok", json!({"limit": 10}), Some(limit_schema())).await;

        let err = mgr.update_module_config("stok", json!({"limit": 0}), true).await.unwrap_err();
        match err {
            ConfigError::Validation { violations } => {
                assert_eq!(violations[0].rule, "min");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(mgr.get_module_config("stok", Some("limit")).await, Some(json!(10)));
    }

    #[tokio::test]
    async fn merge_is_deep_and_replace_is_not() {
        let mgr = ModuleConfigManager::new();
        mgr.register_module_config("crm", json!({"ui": {"theme": "dark", "lang": "tr"}}), None).await;

        mgr.update_module_config("crm", json!({"ui": {"lang": "en"}}), true).await.unwrap();
        assert_eq!(
            mgr.get_module_config("crm", None).await,
            Some(json!({"ui": {"theme": "dark", "lang": "en"}}))
        );

        mgr.update_module_config("crm", json!({"ui": {"lang": "de"}}), false).await.unwrap();
        assert_eq!(mgr.get_module_config("crm", Some("ui.theme")).await, None);
    }

    #[tokio::test]
    async fn dotted_path_set_creates_intermediate_containers() {
        let mgr = ModuleConfigManager::new();
        mgr.register_module_config("crm", json!({}), None).await;
        mgr.set_module_config_value("crm", "mail.smtp.port", json!(587)).await.unwrap();
        assert_eq!(mgr.get_module_config("crm", Some("mail.smtp.port")).await, Some(json!(587)));
        assert_eq!(mgr.get_module_config("crm", Some("mail.pop3.port")).await, None);
    }

    #[tokio::test]
    async fn listeners_observe_old_and_new_and_panics_are_contained() {
        let mgr = ModuleConfigManager::new();
        mgr.register_module_config("stok", json!({"limit": 10}), None).await;

        let seen: Arc<Mutex<Vec<(String, Value, Value)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        mgr.on_change(Arc::new(move |code, old, new| {
            seen_clone.lock().unwrap().push((code.to_string(), old.clone(), new.clone()));
        }))
        .await;
        mgr.on_change(Arc::new(|_, _, _| panic!("listener bug"))).await;

        mgr.update_module_config("stok", json!({"limit": 20}), true).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "stok");
        assert_eq!(seen[0].1, json!({"limit": 10}));
        assert_eq!(seen[0].2, json!({"limit": 20}));
    }

    #[tokio::test]
    async fn reset_restores_default_and_requires_registration() {
        let mgr = ModuleConfigManager::new();
        assert!(matches!(
            mgr.reset_module_config("ghost").await,
            Err(ConfigError::NotRegistered(_))
        ));

        mgr.register_module_config("stok", json!({"limit": 10}), None).await;
        mgr.update_module_config("stok", json!({"limit": 50}), true).await.unwrap();
        let restored = mgr.reset_module_config("stok").await.unwrap();
        assert_eq!(restored, json!({"limit": 10}));
    }
}
