use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Scope and limits of a catalog client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Deployment domain, e.g. `ccip`.
    pub domain: String,
    /// Environment within the domain, e.g. `staging`.
    pub environment: String,
    /// Upper bound for a single request/response exchange, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl CatalogConfig {
    pub fn new(domain: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            environment: environment.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    /// Set the per-request timeout. Precision is one millisecond; shorter
    /// non-zero remainders are dropped and a zero timeout becomes 1 ms.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `domain/environment`, used in logs and as the env metadata cache key.
    pub fn scope(&self) -> String {
        format!("{}/{}", self.domain, self.environment)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.trim().is_empty() {
            return Err(ConfigError::Invalid("domain must not be empty".into()));
        }
        if self.environment.trim().is_empty() {
            return Err(ConfigError::Invalid("environment must not be empty".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_default_timeout() {
        let config = CatalogConfig::from_toml_str(
            r#"
            domain = "ccip"
            environment = "staging"
            "#,
        )
        .unwrap();
        assert_eq!(config, CatalogConfig::new("ccip", "staging"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.scope(), "ccip/staging");
    }

    #[test]
    fn empty_domain_rejected() {
        let err = CatalogConfig::from_toml_str(
            r#"
            domain = " "
            environment = "prod"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = CatalogConfig::from_toml_str(
            r#"
            domain = "ccip"
            environment = "prod"
            request_timeout_ms = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn sub_second_timeout_kept() {
        let config = CatalogConfig::new("ccip", "staging")
            .with_request_timeout(Duration::from_millis(1500));
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
        let config = config.with_request_timeout(Duration::from_millis(200));
        assert_eq!(config.request_timeout_ms, 200);
        let config = config.with_request_timeout(Duration::ZERO);
        assert_eq!(config.request_timeout(), Duration::from_millis(1));
        config.validate().unwrap();
    }

    #[test]
    fn missing_field_is_parse_error() {
        let err = CatalogConfig::from_toml_str(r#"domain = "ccip""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            "domain = \"keystone\"\nenvironment = \"testnet\"\nrequest_timeout_ms = 1500\n",
        )
        .unwrap();
        let config = CatalogConfig::load(&path).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));

        let err = CatalogConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
