use serde::{Deserialize, Serialize};

/// Process-level bootstrap configuration — the handful of values that must
/// be known before the database exists (it names the database's own path)
/// and so cannot themselves live in the `settings` table. Everything else
/// that looks like configuration lives in the store and is synced per
/// [`crate::models::Setting`]'s recognised-key list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default = "d_db_path")]
    pub db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            session: SessionConfig::default(),
            db_path: d_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: d_port(),
            timeout_ms: d_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "d_log_level")]
    pub level: String,
    #[serde(default)]
    pub log_requests: bool,
    #[serde(default)]
    pub log_responses: bool,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: d_log_level(),
            log_requests: false,
            log_responses: false,
            otlp_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "d_session_ttl_ms")]
    pub ttl_ms: i64,
    #[serde(default = "d_session_cleanup_ms")]
    pub cleanup_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_ms: d_session_ttl_ms(),
            cleanup_interval_ms: d_session_cleanup_ms(),
        }
    }
}

fn d_db_path() -> String {
    "gateway.db".to_string()
}
fn d_host() -> String {
    "127.0.0.1".to_string()
}
fn d_port() -> u16 {
    8787
}
fn d_timeout_ms() -> u64 {
    30_000
}
fn d_log_level() -> String {
    "info".to_string()
}
fn d_session_ttl_ms() -> i64 {
    30 * 60 * 1000
}
fn d_session_cleanup_ms() -> u64 {
    10 * 60 * 1000
}

/// Read an environment variable, falling back to `default` when absent or empty.
pub fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Builds the bootstrap config from the recognised environment variables
    /// (`DB_PATH`, `SERVER_PORT`, `SERVER_HOST`, `LOG_LEVEL`,
    /// `SESSION_TIMEOUT_MS`, `SESSION_CLEANUP_MS`), falling back to defaults
    /// for anything unset. Everything else lives in the `settings` table and
    /// is synced at runtime, not read here.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server: ServerConfig {
                host: env_or("SERVER_HOST", &defaults.server.host),
                port: env_parsed("SERVER_PORT", defaults.server.port),
                timeout_ms: defaults.server.timeout_ms,
            },
            logging: LoggingConfig {
                level: env_or("LOG_LEVEL", &defaults.logging.level),
                ..defaults.logging
            },
            session: SessionConfig {
                ttl_ms: env_parsed("SESSION_TIMEOUT_MS", defaults.session.ttl_ms),
                cleanup_interval_ms: env_parsed("SESSION_CLEANUP_MS", defaults.session.cleanup_interval_ms),
            },
            db_path: env_or("DB_PATH", &defaults.db_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 8787);
        assert_eq!(cfg.session.ttl_ms, 30 * 60 * 1000);
    }

    #[test]
    fn env_or_falls_back_when_missing() {
        assert_eq!(env_or("GW_DOMAIN_TEST_NONEXISTENT_VAR", "fallback"), "fallback");
    }
}
