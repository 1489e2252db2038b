//! Configuration management

use crate::config_error;
use crate::error::{ErrorContext, RateError, RateResult};
use crate::types::{
    AnalysisConfig, CacheConfig, GitHubConfig, RateConfig, StorageBackend, StorageConfig,
    TruncatedTreePolicy,
};

use std::path::Path;

const REDACTED: &str = "********";

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig {
                base_url: "https://api.github.com".to_string(),
                token: None,
                timeout_seconds: 30,
                user_agent: format!("ratemynext/{}", env!("CARGO_PKG_VERSION")),
            },
            cache: CacheConfig {
                freshness_ttl_secs: 60 * 60,
                read_ttl_secs: 5 * 60,
                memo_ttl_secs: 60,
                memo_max_entries: 1024,
            },
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                database_url: "sqlite://ratemynext.db?mode=rwc".to_string(),
            },
            analysis: AnalysisConfig {
                truncated_tree: TruncatedTreePolicy::Fail,
            },
        }
    }
}

impl RateConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RateError::Config {
            message: format!("Failed to read config file: {}", e),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: RateConfig = toml::from_str(&content).map_err(|e| RateError::Config {
            message: format!("Failed to parse config: {}", e),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> RateResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RateError::Config {
            message: format!("Failed to serialize config: {}", e),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| RateError::Config {
            message: format!("Failed to write config file: {}", e),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> RateResult<()> {
        if self.github.base_url.trim().is_empty() {
            return Err(config_error!("github.base_url must not be empty", "config"));
        }

        if self.github.timeout_seconds == 0 {
            return Err(config_error!(
                "github.timeout_seconds must be greater than 0",
                "config"
            ));
        }

        if self.cache.memo_ttl_secs > self.cache.freshness_ttl_secs {
            return Err(config_error!(
                "cache.memo_ttl_secs must not exceed cache.freshness_ttl_secs",
                "config"
            ));
        }

        if self.cache.memo_max_entries == 0 {
            return Err(config_error!(
                "cache.memo_max_entries must be greater than 0",
                "config"
            ));
        }

        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.database_url.trim().is_empty()
        {
            return Err(config_error!(
                "storage.database_url is required for the sqlite backend",
                "config"
            ));
        }

        Ok(())
    }

    /// Configured token, falling back to `GITHUB_TOKEN`
    pub fn resolve_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
    }

    /// Copy safe to print: the access token is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(token) = config.github.token.as_mut() {
            *token = REDACTED.to_string();
        }
        config
    }
}
