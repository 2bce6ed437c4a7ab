//! Configuration module for account-service.

use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_SERVICE_NAME: &str = "Account REST API Service";
pub const DEFAULT_SERVICE_VERSION: &str = "1.0";

#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreBackend,
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Where account records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid account store: {}", s)),
        }
    }
}

impl AccountConfig {
    pub fn load() -> Result<Self, AppError> {
        // Loads .env and APP__* settings
        let common = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let store: StoreBackend = env::var("ACCOUNT_STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        if is_prod && store == StoreBackend::Memory {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ACCOUNT_STORE=memory is not allowed in production"
            )));
        }

        let database = match store {
            StoreBackend::Postgres => Some(DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
                min_connections: env_or("DATABASE_MIN_CONNECTIONS", 2),
            }),
            StoreBackend::Memory => None,
        };

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| DEFAULT_SERVICE_VERSION.to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            store,
            database,
        })
    }

    /// Settings for a process-local store, used by tests and local runs.
    pub fn in_memory(port: u16) -> Self {
        Self {
            common: core_config::Config {
                port,
                host: "127.0.0.1".to_string(),
            },
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            store: StoreBackend::Memory,
            database: None,
        }
    }
}

fn env_or(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend() {
        assert_eq!("postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("PostgreSQL".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("mongodb".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn in_memory_config_needs_no_database() {
        let config = AccountConfig::in_memory(0);
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.database.is_none());
        assert_eq!(config.common.bind_address(), "127.0.0.1:0");
        assert_eq!(config.service_version, "1.0");
    }
}
