//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `MARKETPAY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use marketpay::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod escrow;
mod gateway;
mod orders;
mod redis;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use escrow::EscrowConfig;
pub use gateway::GatewayConfig;
pub use orders::OrderServiceConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Redis configuration (event publishing)
    pub redis: RedisConfig,

    /// Payment gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Escrow configuration (grace period, sweep cadence)
    #[serde(default)]
    pub escrow: EscrowConfig,

    /// Order service configuration
    pub orders: OrderServiceConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `MARKETPAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `MARKETPAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `MARKETPAY__DATABASE__URL=...` -> `database.url = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MARKETPAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.gateway.validate()?;
        self.escrow.validate()?;
        self.orders.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; serialize these tests.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var(
            "MARKETPAY__DATABASE__URL",
            "postgresql://test@localhost/marketpay_test",
        );
        env::set_var("MARKETPAY__REDIS__URL", "redis://localhost:6379");
        env::set_var("MARKETPAY__GATEWAY__PROVIDER", "mock");
        env::set_var("MARKETPAY__ORDERS__BASE_URL", "http://localhost:8081");
    }

    fn clear_env() {
        env::remove_var("MARKETPAY__DATABASE__URL");
        env::remove_var("MARKETPAY__REDIS__URL");
        env::remove_var("MARKETPAY__GATEWAY__PROVIDER");
        env::remove_var("MARKETPAY__ORDERS__BASE_URL");
        env::remove_var("MARKETPAY__SERVER__PORT");
        env::remove_var("MARKETPAY__SERVER__ENVIRONMENT");
        env::remove_var("MARKETPAY__ESCROW__AUTO_RELEASE_DAYS");
    }

    #[test]
    fn loads_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("load failed");
        assert_eq!(
            config.database.url,
            "postgresql://test@localhost/marketpay_test"
        );
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn server_defaults_apply() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.escrow.auto_release_days, 30);
    }

    #[test]
    fn environment_override_applies() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("MARKETPAY__SERVER__ENVIRONMENT", "production");
        env::set_var("MARKETPAY__ESCROW__AUTO_RELEASE_DAYS", "14");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert_eq!(config.escrow.auto_release_days, 14);
    }
}
