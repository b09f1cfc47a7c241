//! Provider session shared by every lifecycle operation.
//!
//! A [`Provider`] bundles the compute API client with the retry executor,
//! the async operation lock, and the timeouts that bound blocking waits.

mod wait;

use std::time::Duration;

use crate::compute::{ApiFuture, ComputeApi};
use crate::config::{ProviderConfig, ProviderSettings};
use crate::error::ProviderError;
use crate::lock::AsyncOperationLock;
use crate::retry::{Outcome, Retrier};

/// Deadlines for the blocking waits that follow asynchronous operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LifecycleTimeouts {
    /// Waiting for a deployment to finish.
    pub create: Duration,
    /// Waiting for a change (reconfiguration, disks, adapters) to finish.
    pub update: Duration,
    /// Waiting for a deletion to finish.
    pub delete: Duration,
    /// Waiting for a start, shutdown or power-off to finish.
    pub shutdown: Duration,
}

impl Default for LifecycleTimeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(30 * 60),
            update: Duration::from_secs(10 * 60),
            delete: Duration::from_secs(15 * 60),
            shutdown: Duration::from_secs(5 * 60),
        }
    }
}

/// Session handle passed to lifecycle operations.
#[derive(Debug)]
pub struct Provider<A> {
    api: A,
    settings: ProviderSettings,
    lock: AsyncOperationLock,
    retrier: Retrier,
    timeouts: LifecycleTimeouts,
}

impl<A: ComputeApi> Provider<A> {
    /// Creates a session that serialises asynchronous operations through the
    /// process-wide lock.
    #[must_use]
    pub fn new(api: A, settings: ProviderSettings) -> Self {
        let lock = AsyncOperationLock::global().with_deadline(settings.lock_timeout);
        let retrier = Retrier::new(settings.retry_delay, settings.max_retry_delay);
        Self {
            api,
            settings,
            lock,
            retrier,
            timeouts: LifecycleTimeouts::default(),
        }
    }

    /// Creates a session from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`] when the configuration is invalid.
    pub fn from_config(api: A, config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(api, config.settings()?))
    }

    /// Replaces the async operation lock.
    #[must_use]
    pub fn with_lock(mut self, lock: AsyncOperationLock) -> Self {
        self.lock = lock;
        self
    }

    /// Replaces the lifecycle timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: LifecycleTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The compute API client.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Session settings.
    pub const fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Lifecycle wait deadlines.
    pub const fn timeouts(&self) -> &LifecycleTimeouts {
        &self.timeouts
    }

    /// The async operation lock used by this session.
    pub const fn lock(&self) -> &AsyncOperationLock {
        &self.lock
    }

    /// Runs a remote call, retrying while the platform reports the resource
    /// as busy.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Api`] for terminal API errors and
    /// [`ProviderError::RetryTimeout`] when the retry budget runs out.
    pub async fn retry_action<'a, T, F>(
        &'a self,
        description: &'a str,
        mut operation: F,
    ) -> Result<T, ProviderError>
    where
        F: FnMut(&'a A) -> ApiFuture<'a, T>,
    {
        let api = &self.api;
        self.retrier
            .run(description, self.settings.retry_timeout, |_context| {
                let call = operation(api);
                async move {
                    Outcome::from_api_result(call.await, |err| ProviderError::api(description, err))
                }
            })
            .await
    }

    /// Like [`retry_action`](Self::retry_action), but holds the async
    /// operation lock for the duration of each attempt.
    ///
    /// `operation` is invoked only once the lock is held.
    ///
    /// # Errors
    ///
    /// As [`retry_action`](Self::retry_action), plus [`ProviderError::Lock`]
    /// when the lock cannot be acquired before its deadline.
    pub async fn retry_locked_action<'a, T, F>(
        &'a self,
        description: &'a str,
        operation: F,
    ) -> Result<T, ProviderError>
    where
        F: Fn(&'a A) -> ApiFuture<'a, T>,
    {
        let api = &self.api;
        let lock = &self.lock;
        let build_call = &operation;
        self.retrier
            .run(description, self.settings.retry_timeout, |_context| {
                async move {
                    let mut guard = match lock.acquire(description).await {
                        Ok(guard) => guard,
                        Err(err) => return Outcome::Fail(err.into()),
                    };
                    let result = build_call(api).await;
                    guard.release();
                    Outcome::from_api_result(result, |err| ProviderError::api(description, err))
                }
            })
            .await
    }
}
