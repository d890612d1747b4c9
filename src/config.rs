use std::{env, str::FromStr, time::Duration};

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MySql,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreBackend::MySql),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND `{other}` (expected `mysql` or `memory`)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,

    // Document store
    pub store_backend: StoreBackend,
    /// Unset means the portal starts without a store.
    pub database_url: Option<String>,
    pub db_require_tls: bool,
    pub db_timeout: Duration,
    pub db_max_connections: u32,

    // Sessions
    pub session_ttl: Duration,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,

    pub log_dir: String,
}

/// Reads `key`, falling back to `default` when unset.
fn var_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid value `{raw}` for {key}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store_backend = match lookup("STORE_BACKEND") {
            Some(raw) => raw.parse().context("invalid STORE_BACKEND")?,
            None => StoreBackend::MySql,
        };

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            store_backend,
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_require_tls: var_or(&lookup, "DB_REQUIRE_TLS", true)?,
            db_timeout: Duration::from_secs(var_or(&lookup, "DB_TIMEOUT_SECS", 30)?),
            db_max_connections: var_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            session_ttl: Duration::from_secs(var_or(&lookup, "SESSION_TTL_SECS", 43_200)?), // 12h idle
            session_cookie_name: lookup("SESSION_COOKIE_NAME")
                .unwrap_or_else(|| "portal_session".to_string()),
            session_cookie_secure: var_or(&lookup, "SESSION_COOKIE_SECURE", false)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }
}
