//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ChatConfig, ConfigError, DatabaseConfig, Environment, RedisConfig,
    ServerConfig, IN_MEMORY_DATABASE_URL,
};
