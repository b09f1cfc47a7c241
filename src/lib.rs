//! Reconciliation core for a CloudControl compute provider.
//!
//! The crate drives servers, their disks, network adapters and tags, and
//! server backups towards a declared configuration. Remote calls go through
//! the [`compute::ComputeApi`] contract, busy responses are retried by the
//! [`retry`] executor, and asynchronous platform operations are serialised
//! by the process-wide [`lock::AsyncOperationLock`].

pub mod backup;
pub mod compute;
pub mod config;
pub mod data;
pub mod error;
pub mod lock;
pub mod models;
pub mod provider;
pub mod reconcile;
pub mod resource;
pub mod retry;
pub mod server;
pub mod test_support;

pub use compute::{ApiError, ApiFuture, ComputeApi};
pub use config::{ConfigError, ProviderConfig, ProviderSettings};
pub use data::{ResourceData, ResourceDataExt, ResourceSnapshot};
pub use error::ProviderError;
pub use lock::{AsyncOperationGuard, AsyncOperationLock, LockError};
pub use provider::{LifecycleTimeouts, Provider};
pub use reconcile::{Changes, PlannedChange, ReconciliationAction, SubResource};
pub use resource::{LifecycleFuture, ResourceLifecycle, ServerBackupResource, ServerResource};
pub use retry::{Outcome, Retrier, RetryTimeout};
