//! Provider configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Provider settings derived from environment variables, configuration
/// files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "DDCLOUD")]
pub struct ProviderConfig {
    /// CloudControl user name.
    pub username: String,
    /// CloudControl password.
    pub password: String,
    /// CloudControl region (for example `AU` or `NA`).
    pub region: String,
    /// Upper bound on retrying an operation that reports a busy resource.
    #[ortho_config(default = 600)]
    pub retry_timeout_secs: u64,
    /// Initial backoff between busy retries.
    #[ortho_config(default = 5)]
    pub retry_delay_secs: u64,
    /// Cap on the exponential backoff between busy retries.
    #[ortho_config(default = 30)]
    pub max_retry_delay_secs: u64,
    /// Interval between polls while waiting for asynchronous operations.
    #[ortho_config(default = 5)]
    pub poll_interval_secs: u64,
    /// Optional bound on waiting for the async operation lock.
    pub lock_timeout_secs: Option<u64>,
    /// Permit the provider to start and shut down servers during updates.
    #[ortho_config(default = false)]
    pub allow_server_reboots: bool,
    /// Create tag keys that do not exist yet instead of failing.
    #[ortho_config(default = false)]
    pub auto_create_tag_keys: bool,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ProviderConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to ddcloud.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("ddcloud")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a credential or the region
    /// is empty, and [`ConfigError::Invalid`] when the retry settings cannot
    /// make progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.username,
            &FieldMetadata::new("CloudControl user name", "DDCLOUD_USERNAME", "username"),
        )?;
        Self::require_field(
            &self.password,
            &FieldMetadata::new("CloudControl password", "DDCLOUD_PASSWORD", "password"),
        )?;
        Self::require_field(
            &self.region,
            &FieldMetadata::new("CloudControl region", "DDCLOUD_REGION", "region"),
        )?;
        if self.retry_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "retry_timeout_secs must be greater than zero",
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll_interval_secs must be greater than zero",
            )));
        }
        Ok(())
    }

    /// Validates the configuration and converts it into runtime settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn settings(&self) -> Result<ProviderSettings, ConfigError> {
        self.validate()?;
        Ok(ProviderSettings {
            retry_timeout: Duration::from_secs(self.retry_timeout_secs),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            max_retry_delay: Duration::from_secs(self.max_retry_delay_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            lock_timeout: self.lock_timeout_secs.map(Duration::from_secs),
            allow_server_reboots: self.allow_server_reboots,
            auto_create_tag_keys: self.auto_create_tag_keys,
        })
    }
}

/// Runtime settings shared by every lifecycle operation of a provider
/// session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProviderSettings {
    /// Upper bound on retrying a busy operation.
    pub retry_timeout: Duration,
    /// Initial backoff between busy retries.
    pub retry_delay: Duration,
    /// Cap on the backoff between busy retries.
    pub max_retry_delay: Duration,
    /// Interval between polls while waiting for asynchronous operations.
    pub poll_interval: Duration,
    /// Optional bound on waiting for the async operation lock.
    pub lock_timeout: Option<Duration>,
    /// Whether servers may be started and shut down during updates.
    pub allow_server_reboots: bool,
    /// Whether unknown tag keys are created on demand.
    pub auto_create_tag_keys: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            retry_timeout: Duration::from_secs(600),
            retry_delay: Duration::from_secs(5),
            max_retry_delay: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
            lock_timeout: None,
            allow_server_reboots: false,
            auto_create_tag_keys: false,
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value the provider cannot work with.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}
