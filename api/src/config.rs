//! Server configuration

use serde::{Deserialize, Serialize};

/// Default config location, overridden by `CONFIG_PATH`.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/feedback/api.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("jwt_secret is not set; provide it in the config file or JWT_SECRET")]
    MissingSecret,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// HMAC secret for session tokens. No default; startup fails without one.
    pub jwt_secret: String,
    /// Session lifetime
    pub token_ttl_hours: i64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// Length of generated share codes
    pub share_code_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            jwt_secret: String::new(),
            token_ttl_hours: 24 * 7,
            secure_cookies: true,
            share_code_length: feedback_forms::share_code::DEFAULT_LENGTH,
        }
    }
}

impl ServerConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Load from `CONFIG_PATH`, falling back to defaults, then apply
    /// `BIND_ADDR` / `JWT_SECRET` overrides.
    pub fn from_env() -> Self {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path, error = %e, "Config not loaded, using defaults");
            Self::default()
        });
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.jwt_secret = secret;
        }
    }

    /// Reject configurations the server must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.share_code_length == 0 {
            return Err(ConfigError::Invalid("share_code_length must be positive".into()));
        }
        Ok(())
    }

    /// Session lifetime in seconds.
    pub fn token_ttl_secs(&self) -> i64 {
        self.token_ttl_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{ "bind_addr": "127.0.0.1:9000" }"#).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.token_ttl_hours, 168);
        assert_eq!(config.share_code_length, 8);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config.apply_overrides(|key| match key {
            "JWT_SECRET" => Some("s3cret".into()),
            _ => None,
        });
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.token_ttl_secs(), 604_800);
    }

    #[test]
    fn test_default_config_has_no_secret() {
        let config = ServerConfig::default();
        assert!(config.jwt_secret.is_empty());
        assert!(matches!(config.validate(), Err(ConfigError::MissingSecret)));

        let blank = ServerConfig { jwt_secret: "   ".into(), ..ServerConfig::default() };
        assert!(blank.validate().is_err());

        let configured = ServerConfig { jwt_secret: "s3cret".into(), ..ServerConfig::default() };
        assert!(configured.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(ServerConfig::load("/nonexistent/feedback.json").is_err());
    }
}
