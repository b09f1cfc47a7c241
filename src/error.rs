//! Error types surfaced by the provider's lifecycle operations.

use thiserror::Error;

use crate::compute::ApiError;
use crate::config::ConfigError;
use crate::lock::LockError;
use crate::retry::RetryTimeout;

/// Errors raised by resource lifecycle operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProviderError {
    /// A remote call failed with a terminal (non-busy) error.
    #[error("{action} failed: {source}")]
    Api {
        /// Description of the action that was attempted.
        action: String,
        /// Error returned by the compute API.
        #[source]
        source: ApiError,
    },
    /// A referenced resource does not exist.
    #[error("no {kind} was found with Id '{id}'")]
    NotFound {
        /// Kind of resource (for example `network domain`).
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },
    /// The desired configuration is invalid.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// The selected image requires an initial administrator password.
    #[error("must specify an initial admin password when deploying {0}")]
    MissingAdminPassword(String),
    /// No image matched the configured selector.
    #[error("no {kind} image matching '{selector}' was found in datacenter '{datacenter_id}'")]
    ImageNotFound {
        /// Image kinds that were searched.
        kind: &'static str,
        /// Configured image name or identifier.
        selector: String,
        /// Datacenter used for the lookup.
        datacenter_id: String,
    },
    /// More than one image matched the configured selector.
    #[error("{count} images matching '{selector}' were found in datacenter '{datacenter_id}'")]
    AmbiguousImage {
        /// Configured image name or identifier.
        selector: String,
        /// Datacenter used for the lookup.
        datacenter_id: String,
        /// Number of matches.
        count: usize,
    },
    /// A power operation was requested while server reboots are disabled.
    #[error(
        "cannot {operation} server '{server_id}' because server reboots have not been enabled via the 'allow_server_reboots' provider setting or 'DDCLOUD_ALLOW_SERVER_REBOOTS' environment variable"
    )]
    RebootsDisabled {
        /// Operation that was refused (`start` or `shut down`).
        operation: &'static str,
        /// Target server.
        server_id: String,
    },
    /// A disk change the platform cannot perform (for example shrinking).
    #[error("cannot resize disk '{disk_id}' on server '{server_id}' from {current_gb} GB to {requested_gb} GB")]
    InvalidDiskResize {
        /// Target server.
        server_id: String,
        /// Target disk.
        disk_id: String,
        /// Current size.
        current_gb: u32,
        /// Requested size.
        requested_gb: u32,
    },
    /// Waiting for an asynchronous operation exceeded its deadline.
    #[error("timed out waiting for {action} on '{resource_id}'")]
    Timeout {
        /// Operation being waited on.
        action: String,
        /// Resource identifier.
        resource_id: String,
    },
    /// The retry budget for a busy resource was exhausted.
    #[error(transparent)]
    RetryTimeout(#[from] RetryTimeout),
    /// The async operation lock could not be acquired.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// The platform reported that an asynchronous operation failed.
    #[error("{action} on '{resource_id}' failed; resource is in state {state}")]
    ResourceFailed {
        /// Operation being waited on.
        action: String,
        /// Resource identifier.
        resource_id: String,
        /// State reported by the platform.
        state: String,
    },
    /// Provider configuration could not be loaded or is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Wraps a terminal API error with the action that was attempted.
    #[must_use]
    pub fn api(action: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            action: action.into(),
            source,
        }
    }

    /// Returns `true` for deadline failures, which a caller may re-attempt
    /// as a whole.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::RetryTimeout(_) | Self::Lock(LockError::Timeout { .. })
        )
    }

    /// Returns `true` for errors caused by the desired configuration.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::MissingAdminPassword(_)
                | Self::ImageNotFound { .. }
                | Self::AmbiguousImage { .. }
                | Self::RebootsDisabled { .. }
                | Self::InvalidDiskResize { .. }
        )
    }
}

impl From<ConfigError> for ProviderError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
