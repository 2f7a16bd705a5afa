//! Error types used by services and the orchestrator.
//!
//! [`ServiceError`] is the single error type flowing through the
//! [`Service`](crate::Service) contract. Per-service failures raised during
//! [`Multi::run`](crate::Multi::run) and [`Multi::shutdown`](crate::Multi::shutdown)
//! are collapsed into one value by [`collapse`](crate::aggregate::collapse); two or
//! more failures end up in [`ServiceError::Multiple`].
//!
//! Every variant has a stable label ([`ServiceError::as_label`]) for logs/metrics.

use std::fmt;

use thiserror::Error;

use crate::aggregate::MultiError;

/// Boxed foreign error carried by [`ServiceError::Other`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lifecycle operation that may only be performed once per orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Run,
    Shutdown,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Run => f.write_str("run"),
            Lifecycle::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// # Errors produced by services and by the orchestrator.
///
/// A service reports its own failures as [`ServiceError::Fail`] (or wraps a
/// foreign error in [`ServiceError::Other`]). The remaining variants are produced
/// by this crate.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service failed; the message is rendered verbatim.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Foreign error returned by a service.
    #[error(transparent)]
    Other(#[from] BoxError),

    /// `run` or `shutdown` was called more than once on the same orchestrator.
    #[error("{op} called twice")]
    RepeatedCall {
        /// The operation that was repeated.
        op: Lifecycle,
    },

    /// The run task of a service panicked.
    #[error("service {service} panicked: {message}")]
    Panicked {
        /// Name of the service whose task panicked.
        service: String,
        /// Panic payload, if it was a string.
        message: String,
    },

    /// The shutdown context reached its deadline before the work finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The shutdown context was cancelled before the work finished.
    #[error("context cancelled")]
    Canceled,

    /// Registering for OS signals failed.
    #[error("signal registration failed: {error}")]
    Signal {
        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },

    /// Two or more services failed.
    #[error(transparent)]
    Multiple(#[from] MultiError),
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Fail`].
    ///
    /// # Example
    /// ```
    /// use servexec::ServiceError;
    ///
    /// let err = ServiceError::fail("database unreachable");
    /// assert_eq!(err.to_string(), "database unreachable");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        ServiceError::Fail {
            error: error.into(),
        }
    }

    /// Wraps any foreign error.
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ServiceError::Other(Box::new(error))
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servexec::{Lifecycle, ServiceError};
    ///
    /// let err = ServiceError::RepeatedCall { op: Lifecycle::Run };
    /// assert_eq!(err.as_label(), "repeated_call");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Fail { .. } => "service_failed",
            ServiceError::Other(_) => "service_error",
            ServiceError::RepeatedCall { .. } => "repeated_call",
            ServiceError::Panicked { .. } => "service_panicked",
            ServiceError::DeadlineExceeded => "deadline_exceeded",
            ServiceError::Canceled => "context_canceled",
            ServiceError::Signal { .. } => "signal_registration",
            ServiceError::Multiple(_) => "multiple",
        }
    }

    /// True for the repeated-call kind returned by a second `run`/`shutdown`.
    pub fn is_repeated_call(&self) -> bool {
        matches!(self, ServiceError::RepeatedCall { .. })
    }

    /// Per-service failures carried by this error.
    ///
    /// A composite yields its members in registration order; any other error
    /// yields itself.
    pub fn failures(&self) -> Vec<&ServiceError> {
        match self {
            ServiceError::Multiple(m) => m.iter().collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_renders_message_verbatim() {
        let err = ServiceError::fail("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.as_label(), "service_failed");
    }

    #[test]
    fn repeated_call_is_distinguishable() {
        let run = ServiceError::RepeatedCall { op: Lifecycle::Run };
        let shutdown = ServiceError::RepeatedCall {
            op: Lifecycle::Shutdown,
        };
        assert!(run.is_repeated_call());
        assert!(!ServiceError::fail("x").is_repeated_call());
        assert_eq!(run.to_string(), "run called twice");
        assert_eq!(shutdown.to_string(), "shutdown called twice");
    }

    #[test]
    fn other_is_transparent() {
        let io = std::io::Error::other("disk gone");
        let err = ServiceError::other(io);
        assert_eq!(err.to_string(), "disk gone");
        assert_eq!(err.failures().len(), 1);
    }
}
