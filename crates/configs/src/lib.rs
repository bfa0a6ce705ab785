use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pool: PoolConfig,
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

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

/// Credential pool and migration engine tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Base URL of the remote voice platform API.
    #[serde(default = "default_platform_base_url")]
    pub platform_base_url: String,
    /// Timeout for registration create/delete calls, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for capability probes, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Attempts before a migration is abandoned as dead.
    #[serde(default = "default_max_migration_attempts")]
    pub max_migration_attempts: u32,
    /// Concurrent workers for batch migrations.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// Attempts popped per retry-queue replay.
    #[serde(default = "default_queue_batch_size")]
    pub queue_batch_size: u64,
    /// Seconds between scheduled health-check rounds.
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,
    /// Seconds between scheduled retry-queue replays.
    #[serde(default = "default_queue_replay_interval")]
    pub queue_replay_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            platform_base_url: default_platform_base_url(),
            request_timeout_secs: default_request_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            max_migration_attempts: default_max_migration_attempts(),
            batch_concurrency: default_batch_concurrency(),
            queue_batch_size: default_queue_batch_size(),
            health_check_interval_secs: default_health_check_interval(),
            queue_replay_interval_secs: default_queue_replay_interval(),
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_platform_base_url() -> String { "https://api.voice-platform.example".to_string() }
fn default_request_timeout() -> u64 { 8 }
fn default_probe_timeout() -> u64 { 5 }
fn default_max_migration_attempts() -> u32 { 3 }
fn default_batch_concurrency() -> usize { 5 }
fn default_queue_batch_size() -> u64 { 50 }
fn default_health_check_interval() -> u64 { 300 }
fn default_queue_replay_interval() -> u64 { 600 }

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
        // Database URL may come from the environment instead of TOML.
        self.database.normalize_from_env();
        self.database.validate()?;
        self.pool.validate()?;
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
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; provide it in config.toml or via DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive integer seconds"));
        }
        Ok(())
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<()> {
        if self.platform_base_url.trim().is_empty() {
            return Err(anyhow!("pool.platform_base_url is empty"));
        }
        if self.request_timeout_secs == 0 || self.probe_timeout_secs == 0 {
            return Err(anyhow!("pool timeouts must be positive integer seconds"));
        }
        if self.max_migration_attempts == 0 {
            return Err(anyhow!("pool.max_migration_attempts must be >= 1"));
        }
        if self.batch_concurrency == 0 || self.batch_concurrency > 32 {
            return Err(anyhow!("pool.batch_concurrency must be in 1..=32"));
        }
        if self.queue_batch_size == 0 {
            return Err(anyhow!("pool.queue_batch_size must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let cfg = PoolConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.max_migration_attempts, 3);
        assert_eq!(cfg.batch_concurrency, 5);
    }

    #[test]
    fn zero_attempts_rejected() {
        let cfg = PoolConfig { max_migration_attempts: 0, ..PoolConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_pool_section() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [pool]
            platform_base_url = "https://api.example.com"
            request_timeout_secs = 4
            batch_concurrency = 8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.pool.request_timeout_secs, 4);
        assert_eq!(cfg.pool.batch_concurrency, 8);
        // omitted keys fall back to defaults
        assert_eq!(cfg.pool.queue_batch_size, 50);
    }
}
