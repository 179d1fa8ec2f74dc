use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// TTL tuning for the permission cache tiers.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_permission_ttl")]
    pub permission_ttl_secs: u64,
    #[serde(default = "default_menu_ttl")]
    pub menu_ttl_secs: u64,
    #[serde(default = "default_point_check_ttl")]
    pub point_check_ttl_secs: u64,
    #[serde(default = "default_local_capacity")]
    pub local_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            permission_ttl_secs: default_permission_ttl(),
            menu_ttl_secs: default_menu_ttl(),
            point_check_ttl_secs: default_point_check_ttl(),
            local_capacity: default_local_capacity(),
        }
    }
}

fn default_permission_ttl() -> u64 { 1800 }
fn default_menu_ttl() -> u64 { 1800 }
fn default_point_check_ttl() -> u64 { 300 }
fn default_local_capacity() -> u64 { 10_000 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.cache.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            _ => {}
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.permission_ttl_secs == 0 || self.menu_ttl_secs == 0 {
            return Err(anyhow!("cache TTLs must be positive integer seconds"));
        }
        if self.point_check_ttl_secs == 0 {
            return Err(anyhow!("cache.point_check_ttl_secs must be >= 1"));
        }
        if self.local_capacity == 0 {
            return Err(anyhow!("cache.local_capacity must be >= 1"));
        }
        Ok(())
    }
}
