//! Error type for compute API operations.

use thiserror::Error;

/// Errors raised by the compute API client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// The platform rejected the request because a related resource is busy
    /// with another asynchronous operation.
    #[error("resource busy: {message}")]
    ResourceBusy {
        /// Message returned by the platform.
        message: String,
    },
    /// The platform answered with a non-success response code.
    #[error("{response_code}: {message}")]
    Response {
        /// Response code reported by the platform (for example
        /// `INVALID_INPUT_DATA`).
        response_code: String,
        /// Message returned by the platform.
        message: String,
    },
    /// The request never produced a usable response.
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl ApiError {
    /// Builds a busy error.
    #[must_use]
    pub fn busy(message: impl Into<String>) -> Self {
        Self::ResourceBusy {
            message: message.into(),
        }
    }

    /// Builds a response error with the given code.
    #[must_use]
    pub fn response(response_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Response {
            response_code: response_code.into(),
            message: message.into(),
        }
    }

    /// Returns `true` when the request may succeed if retried later.
    #[must_use]
    pub const fn is_resource_busy(&self) -> bool {
        matches!(self, Self::ResourceBusy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_busy_errors_are_retryable() {
        assert!(ApiError::busy("server is deploying").is_resource_busy());
        assert!(!ApiError::response("INVALID_INPUT_DATA", "bad").is_resource_busy());
        assert!(
            !ApiError::Transport {
                message: String::from("connection reset"),
            }
            .is_resource_busy()
        );
    }
}
