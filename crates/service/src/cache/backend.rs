use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a distributed cache backend. Callers in this crate
/// treat every variant as a miss; the backend being down is never fatal.
#[derive(Debug, Error)]
pub enum CacheBackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Abstraction over the out-of-process key-value store shared across
/// process instances (the second cache tier).
///
/// Implementations can be Redis-backed, memcached-backed, or in-memory for
/// tests and single-node deployments.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError>;
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheBackendError>;
    async fn delete(&self, key: &str) -> Result<bool, CacheBackendError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheBackendError>;
    /// Remaining time-to-live, `None` when the key has no expiry or is absent.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheBackendError>;
    /// Keys matching a glob-style pattern; only a trailing `*` is required.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheBackendError>;
    async fn flush(&self) -> Result<(), CacheBackendError>;
}

/// Simple in-memory backend for tests and single-node deployments.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Instant;

    struct Entry {
        value: String,
        expires_at: Option<Instant>,
    }

    impl Entry {
        fn expired(&self) -> bool {
            self.expires_at.is_some_and(|at| Instant::now() >= at)
        }
    }

    #[derive(Default)]
    pub struct InMemoryCache {
        entries: Mutex<HashMap<String, Entry>>,
    }

    impl InMemoryCache {
        pub fn new() -> Self {
            Self::default()
        }
    }

    fn matches(pattern: &str, key: &str) -> bool {
        match pattern.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix),
            None => key == pattern,
        }
    }

    #[async_trait]
    impl DistributedCache for InMemoryCache {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError> {
            let mut entries = self.entries.lock().unwrap();
            match entries.get(key) {
                Some(e) if e.expired() => {
                    entries.remove(key);
                    Ok(None)
                }
                Some(e) => Ok(Some(e.value.clone())),
                None => Ok(None),
            }
        }

        async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheBackendError> {
            let mut entries = self.entries.lock().unwrap();
            entries.insert(
                key.to_string(),
                Entry { value, expires_at: ttl.map(|d| Instant::now() + d) },
            );
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, CacheBackendError> {
            let mut entries = self.entries.lock().unwrap();
            Ok(entries.remove(key).is_some())
        }

        async fn exists(&self, key: &str) -> Result<bool, CacheBackendError> {
            self.get(key).await.map(|v| v.is_some())
        }

        async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheBackendError> {
            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).filter(|e| !e.expired()).and_then(|e| {
                e.expires_at.map(|at| at.saturating_duration_since(Instant::now()))
            }))
        }

        async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheBackendError> {
            let mut entries = self.entries.lock().unwrap();
            entries.retain(|_, e| !e.expired());
            Ok(entries.keys().filter(|k| matches(pattern, k)).cloned().collect())
        }

        async fn flush(&self) -> Result<(), CacheBackendError> {
            self.entries.lock().unwrap().clear();
            Ok(())
        }
    }

    /// Backend that fails every call; used to exercise degradation paths.
    pub struct UnavailableCache;

    #[async_trait]
    impl DistributedCache for UnavailableCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheBackendError> {
            Err(CacheBackendError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<(), CacheBackendError> {
            Err(CacheBackendError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> Result<bool, CacheBackendError> {
            Err(CacheBackendError::Unavailable("connection refused".into()))
        }
        async fn exists(&self, _key: &str) -> Result<bool, CacheBackendError> {
            Err(CacheBackendError::Unavailable("connection refused".into()))
        }
        async fn ttl(&self, _key: &str) -> Result<Option<Duration>, CacheBackendError> {
            Err(CacheBackendError::Unavailable("connection refused".into()))
        }
        async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheBackendError> {
            Err(CacheBackendError::Unavailable("connection refused".into()))
        }
        async fn flush(&self) -> Result<(), CacheBackendError> {
            Err(CacheBackendError::Unavailable("connection refused".into()))
        }
    }
}
