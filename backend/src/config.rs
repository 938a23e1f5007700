//! Configuration management for the BASP marketplace server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with BASP_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Discovery, ranking and pagination tuning
    pub discovery: DiscoveryConfig,

    /// Administrator account seeded at startup when present
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    /// Businesses farther than this from the caller are dropped from geo searches
    pub max_radius_km: f64,

    /// Repeat contacts within this window do not bump a business's priority
    pub contact_cooldown_secs: i64,

    pub default_page_size: u32,

    pub max_page_size: u32,

    /// Review window for the "best providers" listing
    pub bests_window_days: i64,

    pub bests_limit: i64,
}

/// Bootstrap administrator credentials
///
/// Administrators cannot register through the API; this is how the first one
/// comes into existence.
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AdminConfig {
    #[validate(email(message = "Invalid admin email"))]
    pub email: String,

    pub password: String,

    #[serde(default = "default_admin_name")]
    pub first_name: String,

    #[serde(default = "default_admin_name")]
    pub last_name: String,
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

impl AdminConfig {
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        shared::validate_password(&self.password)?;
        shared::validate_not_blank("firstName", &self.first_name)?;
        shared::validate_not_blank("lastName", &self.last_name)?;
        Ok(())
    }
}

impl DiscoveryConfig {
    pub fn contact_cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.contact_cooldown_secs)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_radius_km: shared::geo::DEFAULT_MAX_RADIUS_KM,
            contact_cooldown_secs: shared::ranking::DEFAULT_CONTACT_COOLDOWN_SECS,
            default_page_size: shared::pagination::DEFAULT_PAGE_SIZE,
            max_page_size: shared::pagination::MAX_PAGE_SIZE,
            bests_window_days: 30,
            bests_limit: 10,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("BASP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let discovery = DiscoveryConfig::default();

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("discovery.max_radius_km", discovery.max_radius_km)?
            .set_default("discovery.contact_cooldown_secs", discovery.contact_cooldown_secs)?
            .set_default("discovery.default_page_size", i64::from(discovery.default_page_size))?
            .set_default("discovery.max_page_size", i64::from(discovery.max_page_size))?
            .set_default("discovery.bests_window_days", discovery.bests_window_days)?
            .set_default("discovery.bests_limit", discovery.bests_limit)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (BASP_ prefix)
            .add_source(
                Environment::with_prefix("BASP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_defaults() {
        let discovery = DiscoveryConfig::default();
        assert_eq!(discovery.max_radius_km, 1000.0);
        assert_eq!(discovery.contact_cooldown(), chrono::Duration::hours(1));
        assert_eq!(discovery.default_page_size, 10);
        assert_eq!(discovery.max_page_size, 100);
    }

    fn admin(email: &str, password: &str) -> AdminConfig {
        AdminConfig {
            email: email.into(),
            password: password.into(),
            first_name: default_admin_name(),
            last_name: default_admin_name(),
        }
    }

    #[test]
    fn test_admin_config_check() {
        assert!(admin("root@basp.example", "correct-horse").check().is_ok());
        assert!(admin("not-an-email", "correct-horse").check().is_err());
        assert!(admin("root@basp.example", "short").check().is_err());
    }

    #[test]
    fn test_admin_section_is_optional() {
        let config: Config = config::Config::builder()
            .set_default("environment", "test")
            .and_then(|b| b.set_default("server.port", 3000))
            .and_then(|b| b.set_default("server.host", "127.0.0.1"))
            .and_then(|b| b.set_default("database.url", "postgres://localhost/basp"))
            .and_then(|b| b.set_default("database.max_connections", 1))
            .and_then(|b| b.set_default("database.min_connections", 1))
            .and_then(|b| b.set_default("jwt.secret", "secret"))
            .and_then(|b| b.set_default("jwt.access_token_expiry", 60))
            .and_then(|b| b.set_default("jwt.refresh_token_expiry", 120))
            .and_then(|b| b.set_default("discovery.max_radius_km", 1000.0))
            .and_then(|b| b.set_default("discovery.contact_cooldown_secs", 3600))
            .and_then(|b| b.set_default("discovery.default_page_size", 10))
            .and_then(|b| b.set_default("discovery.max_page_size", 100))
            .and_then(|b| b.set_default("discovery.bests_window_days", 30))
            .and_then(|b| b.set_default("discovery.bests_limit", 10))
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(config.admin.is_none());
    }
}
