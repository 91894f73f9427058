//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// `DATABASE_URL` scheme that selects the in-memory store
pub const IN_MEMORY_DATABASE_URL: &str = "memory://";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub database: DatabaseConfig,
    /// `None` keeps the history cache in-process
    pub redis: Option<RedisConfig>,
    pub chat: ChatConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Server configuration for the chat gateway
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Whether the in-memory store was requested instead of PostgreSQL
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with(IN_MEMORY_DATABASE_URL)
    }
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Chat subsystem tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Seconds between heartbeat pings
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    /// Seconds an unauthenticated socket may stay open
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,
    #[serde(default = "default_history_cache_ttl")]
    pub history_cache_ttl_secs: u64,
    #[serde(default = "default_contacts_cache_ttl")]
    pub contacts_cache_ttl_secs: u64,
    #[serde(default = "default_projects_cache_ttl")]
    pub projects_cache_ttl_secs: u64,
    #[serde(default = "default_idempotency_ttl")]
    pub idempotency_ttl_secs: u64,
    #[serde(default = "default_idempotency_sweep")]
    pub idempotency_sweep_secs: u64,
    /// Outbound queue capacity per connection
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl ChatConfig {
    /// Never zero; a zero-period ticker would panic
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    #[must_use]
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    #[must_use]
    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }

    #[must_use]
    pub fn idempotency_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.idempotency_sweep_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            auth_timeout_secs: default_auth_timeout(),
            history_cache_ttl_secs: default_history_cache_ttl(),
            contacts_cache_ttl_secs: default_contacts_cache_ttl(),
            projects_cache_ttl_secs: default_projects_cache_ttl(),
            idempotency_ttl_secs: default_idempotency_ttl(),
            idempotency_sweep_secs: default_idempotency_sweep(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "market-chat".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_auth_timeout() -> u64 {
    30
}

fn default_history_cache_ttl() -> u64 {
    300
}

fn default_contacts_cache_ttl() -> u64 {
    60
}

fn default_projects_cache_ttl() -> u64 {
    300
}

fn default_idempotency_ttl() -> u64 {
    6 * 60 * 60
}

fn default_idempotency_sweep() -> u64 {
    60
}

fn default_outbound_buffer() -> usize {
    100
}

/// Parse an optional variable, falling back to `default` when absent or unparseable
fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: fn() -> T) -> T {
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or_else(default)
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("GATEWAY_PORT").ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?;
        let port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("GATEWAY_PORT", port.clone()))?;

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .as_deref()
                    .and_then(Environment::parse)
                    .unwrap_or_default(),
            },
            gateway: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", default_max_connections),
                min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", default_min_connections),
            },
            redis: lookup("REDIS_URL")
                .filter(|url| !url.trim().is_empty())
                .map(|url| RedisConfig {
                    url,
                    max_connections: parse_or(
                        &lookup,
                        "REDIS_MAX_CONNECTIONS",
                        default_redis_max_connections,
                    ),
                }),
            chat: ChatConfig {
                heartbeat_interval_secs: parse_or(
                    &lookup,
                    "CHAT_HEARTBEAT_INTERVAL_SECS",
                    default_heartbeat_interval,
                ),
                auth_timeout_secs: parse_or(&lookup, "CHAT_AUTH_TIMEOUT_SECS", default_auth_timeout),
                history_cache_ttl_secs: parse_or(
                    &lookup,
                    "CHAT_HISTORY_CACHE_TTL_SECS",
                    default_history_cache_ttl,
                ),
                contacts_cache_ttl_secs: parse_or(
                    &lookup,
                    "CHAT_CONTACTS_CACHE_TTL_SECS",
                    default_contacts_cache_ttl,
                ),
                projects_cache_ttl_secs: parse_or(
                    &lookup,
                    "CHAT_PROJECTS_CACHE_TTL_SECS",
                    default_projects_cache_ttl,
                ),
                idempotency_ttl_secs: parse_or(
                    &lookup,
                    "CHAT_IDEMPOTENCY_TTL_SECS",
                    default_idempotency_ttl,
                ),
                idempotency_sweep_secs: parse_or(
                    &lookup,
                    "CHAT_IDEMPOTENCY_SWEEP_SECS",
                    default_idempotency_sweep,
                ),
                outbound_buffer: parse_or(&lookup, "CHAT_OUTBOUND_BUFFER", default_outbound_buffer),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
