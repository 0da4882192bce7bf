use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the meal-generation and session APIs.
    pub base_url: String,
    /// Base URL of the grocery-checkout-link service.
    pub services_url: String,
    #[serde(default)]
    pub auth_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub database_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (MEALSMITH__API__BASE_URL, etc.)
    /// 2. Config file specified by path
    /// 3. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("api.base_url", "http://localhost:8080")?
            .set_default("api.services_url", "http://localhost:8081")?
            .set_default("cache.database_url", "sqlite:mealsmith.db")?
            .set_default("cache.max_connections", 5)?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Config file is optional
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("MEALSMITH")
                .separator("__")
                .try_parsing(true),
        );

        // Also support legacy environment variables without prefix
        if let Ok(database_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("cache.database_url", database_url)?;
        }
        if let Ok(auth_token) = env::var("AUTH_TOKEN") {
            builder = builder.set_override("api.auth_token", auth_token)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| format!("api.base_url is not a valid URL: {e}"))?;
        url::Url::parse(&self.api.services_url)
            .map_err(|e| format!("api.services_url is not a valid URL: {e}"))?;
        if self.cache.database_url.is_empty() {
            return Err("cache.database_url must not be empty".to_string());
        }
        if self.cache.max_connections < 1 {
            return Err("cache.max_connections must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                services_url: "http://localhost:8081".to_string(),
                auth_token: String::new(),
            },
            cache: CacheConfig {
                database_url: "sqlite:test.db".to_string(),
                max_connections: 5,
            },
            observability: ObservabilityConfig::default(),
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_bad_base_url() {
        let mut config = valid_config();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_database_url() {
        let mut config = valid_config();
        config.cache.database_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_connections() {
        let mut config = valid_config();
        config.cache.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
