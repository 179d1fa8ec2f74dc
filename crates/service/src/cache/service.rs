use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::backend::DistributedCache;

/// Thin get/set/delete wrapper over the distributed cache tier.
///
/// Every operation absorbs backend failures: a broken backend is logged at
/// `warn` and reported as a miss (or a no-op for writes), never propagated.
pub struct PermissionCacheService {
    backend: Arc<dyn DistributedCache>,
}

impl PermissionCacheService {
    pub fn new(backend: Arc<dyn DistributedCache>) -> Self {
        Self { backend }
    }

    /// Fetch and deserialize a JSON value; `None` on miss, decode failure, or
    /// backend degradation.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(v) => v?,
            Err(e) => {
                warn!(%key, error = %e, "distributed cache get failed; treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(%key, error = %e, "stale cache payload failed to decode; dropping");
                let _ = self.backend.delete(key).await;
                None
            }
        }
    }

    /// Serialize and store a JSON value with an optional TTL; best-effort.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let raw = match serde_json::to_string(value) {
            Ok(r) => r,
            Err(e) => {
                warn!(%key, error = %e, "failed to serialize cache payload; skipping write");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, raw, ttl).await {
            warn!(%key, error = %e, "distributed cache set failed; skipping write");
        }
    }

    /// Best-effort delete; returns whether a key was removed.
    pub async fn delete(&self, key: &str) -> bool {
        match self.backend.delete(key).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(%key, error = %e, "distributed cache delete failed");
                false
            }
        }
    }

    /// Delete every key under a prefix; returns the number removed.
    pub async fn delete_by_prefix(&self, prefix: &str) -> usize {
        let pattern = format!("{prefix}*");
        let keys = match self.backend.keys(&pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(%prefix, error = %e, "distributed cache keys scan failed");
                return 0;
            }
        };
        let mut removed = 0;
        for key in keys {
            if self.delete(&key).await {
                removed += 1;
            }
        }
        removed
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.backend.exists(key).await {
            Ok(present) => present,
            Err(e) => {
                warn!(%key, error = %e, "distributed cache exists failed; treating as miss");
                false
            }
        }
    }

    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        match self.backend.ttl(key).await {
            Ok(ttl) => ttl,
            Err(e) => {
                warn!(%key, error = %e, "distributed cache ttl failed");
                None
            }
        }
    }

    pub async fn flush(&self) {
        if let Err(e) = self.backend.flush().await {
            warn!(error = %e, "distributed cache flush failed");
        }
    }

    /// Liveness probe for status reporting.
    pub async fn is_healthy(&self) -> bool {
        self.backend.exists("modcore:probe").await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backend::memory::{InMemoryCache, UnavailableCache};

    #[tokio::test]
    async fn json_round_trip() {
        let svc = PermissionCacheService::new(Arc::new(InMemoryCache::new()));
        svc.set_json("k", &vec!["a".to_string(), "b".to_string()], None).await;
        let back: Option<Vec<String>> = svc.get_json("k").await;
        assert_eq!(back, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[tokio::test]
    async fn unavailable_backend_degrades_to_miss() {
        let svc = PermissionCacheService::new(Arc::new(UnavailableCache));
        svc.set_json("k", &1u32, None).await;
        let back: Option<u32> = svc.get_json("k").await;
        assert_eq!(back, None);
        assert!(!svc.delete("k").await);
        assert_eq!(svc.delete_by_prefix("perm:").await, 0);
        assert!(!svc.is_healthy().await);
    }

    #[tokio::test]
    async fn delete_by_prefix_scopes_to_namespace() {
        let svc = PermissionCacheService::new(Arc::new(InMemoryCache::new()));
        svc.set_json("perm:user:1", &1u32, None).await;
        svc.set_json("perm:user:2", &2u32, None).await;
        svc.set_json("menu:user:1", &3u32, None).await;
        assert_eq!(svc.delete_by_prefix("perm:user:").await, 2);
        assert!(svc.exists("menu:user:1").await);
    }

    #[tokio::test]
    async fn undecodable_payload_is_dropped() {
        let backend = Arc::new(InMemoryCache::new());
        backend.set("k", "not json".into(), None).await.unwrap();
        let svc = PermissionCacheService::new(backend.clone());
        let back: Option<Vec<String>> = svc.get_json("k").await;
        assert_eq!(back, None);
        assert_eq!(backend.get("k").await.unwrap(), None);
    }
}
