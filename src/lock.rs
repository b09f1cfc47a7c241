//! Process-wide lock serialising asynchronous operations on the platform.
//!
//! CloudControl queues deploy, delete and power operations per account and
//! rejects overlapping ones as busy. Holding this lock around those calls
//! keeps the provider from provoking its own retry storms.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tokio::time::timeout;
use tracing::debug;

static GLOBAL_LOCK: LazyLock<AsyncOperationLock> = LazyLock::new(AsyncOperationLock::new);

/// Errors raised while acquiring the lock.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LockError {
    /// The lock was not released within the configured deadline.
    #[error("timed out acquiring the async operation lock for {description:?}; held by {}", .holder.as_deref().unwrap_or("unknown operation"))]
    Timeout {
        /// Operation waiting for the lock.
        description: String,
        /// Operation holding the lock when the deadline passed.
        holder: Option<String>,
    },
}

#[derive(Debug)]
struct LockState {
    mutex: Arc<tokio::sync::Mutex<()>>,
    holder: Arc<Mutex<Option<String>>>,
}

/// Binary lock shared by every operation that issues serialised calls.
///
/// Clones share the same underlying lock.
#[derive(Clone, Debug)]
pub struct AsyncOperationLock {
    state: Option<Arc<LockState>>,
    deadline: Option<Duration>,
}

impl AsyncOperationLock {
    /// Creates an independent lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Some(Arc::new(LockState {
                mutex: Arc::new(tokio::sync::Mutex::new(())),
                holder: Arc::new(Mutex::new(None)),
            })),
            deadline: None,
        }
    }

    /// Returns a handle to the process-wide lock.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_LOCK.clone()
    }

    /// Returns a lock that never blocks, for tests and single-operation
    /// tooling.
    #[must_use]
    pub const fn noop() -> Self {
        Self {
            state: None,
            deadline: None,
        }
    }

    /// Bounds how long [`acquire`](Self::acquire) waits; `None` waits
    /// indefinitely.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Describes the operation currently holding the lock, if any.
    #[must_use]
    pub fn holder(&self) -> Option<String> {
        self.state.as_ref().and_then(|state| {
            state
                .holder
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    /// Waits until the lock is free and takes it on behalf of
    /// `description`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] when a deadline is configured and the
    /// current holder does not release in time.
    pub async fn acquire(&self, description: &str) -> Result<AsyncOperationGuard, LockError> {
        let Some(state) = self.state.as_ref() else {
            return Ok(AsyncOperationGuard::empty());
        };

        let guard = if let Ok(guard) = Arc::clone(&state.mutex).try_lock_owned() {
            guard
        } else {
            debug!(
                operation = description,
                holder = self.holder().as_deref().unwrap_or("unknown"),
                "waiting for async operation lock"
            );
            let pending = Arc::clone(&state.mutex).lock_owned();
            match self.deadline {
                Some(limit) => timeout(limit, pending)
                    .await
                    .map_err(|_elapsed| LockError::Timeout {
                        description: description.to_owned(),
                        holder: self.holder(),
                    })?,
                None => pending.await,
            }
        };

        *state
            .holder
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(description.to_owned());
        Ok(AsyncOperationGuard {
            guard: Some(guard),
            holder: Some(Arc::clone(&state.holder)),
        })
    }
}

impl Default for AsyncOperationLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of lock ownership; the lock is released on drop at the latest.
#[derive(Debug)]
pub struct AsyncOperationGuard {
    guard: Option<OwnedMutexGuard<()>>,
    holder: Option<Arc<Mutex<Option<String>>>>,
}

impl AsyncOperationGuard {
    const fn empty() -> Self {
        Self {
            guard: None,
            holder: None,
        }
    }

    /// Releases the lock. Calling this more than once has no effect.
    pub fn release(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        if let Some(holder) = self.holder.take() {
            *holder.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }
        drop(guard);
    }
}

impl Drop for AsyncOperationGuard {
    fn drop(&mut self) {
        self.release();
    }
}
