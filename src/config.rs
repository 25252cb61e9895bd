//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Environment (development, production)
    pub environment: String,

    /// Attempts per membership command when appends conflict
    pub command_max_retries: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load `.env` if present, then read the environment
    pub fn from_dotenv() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Build configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let command_max_retries = lookup("COMMAND_MAX_RETRIES")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("COMMAND_MAX_RETRIES"))?;

        if command_max_retries == 0 {
            return Err(ConfigError::InvalidValue("COMMAND_MAX_RETRIES"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            environment,
            command_max_retries,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/members")]))
                .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/members");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.environment, "development");
        assert_eq!(config.command_max_retries, 3);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/members"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("ENVIRONMENT", "production"),
            ("COMMAND_MAX_RETRIES", "5"),
        ]))
        .unwrap();

        assert_eq!(config.database_max_connections, 4);
        assert_eq!(config.command_max_retries, 5);
        assert!(config.is_production());
    }

    #[test]
    fn test_missing_database_url() {
        let result = Config::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnv("DATABASE_URL"))));
    }

    #[test]
    fn test_invalid_numbers() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/members"),
            ("DATABASE_MAX_CONNECTIONS", "many"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))
        ));

        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/members"),
            ("COMMAND_MAX_RETRIES", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue("COMMAND_MAX_RETRIES"))
        ));
    }
}
