//! API configuration

use serde::Deserialize;

use core_kernel::{CoreError, Timezone};

/// API configuration
///
/// Read from `API_`-prefixed environment variables, e.g. `API_PORT=8080`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Directory receipt files are stored under
    pub media_root: String,
    /// IANA timezone of the office, e.g. `Asia/Shanghai`
    pub timezone: String,
    /// Largest accepted receipt upload
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/expenses".to_string(),
            log_level: "info".to_string(),
            media_root: "media".to_string(),
            timezone: "Asia/Shanghai".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the configured timezone
    pub fn timezone(&self) -> Result<Timezone, CoreError> {
        self.timezone.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.timezone().unwrap(), Timezone::default());
        assert_eq!(config.max_upload_bytes, 10_485_760);
    }

    #[test]
    fn test_bad_timezone_is_configuration_error() {
        let config = ApiConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.timezone(), Err(CoreError::Configuration(_))));
    }
}
