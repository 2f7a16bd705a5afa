//! # Cancellation context passed to `Service::shutdown`.
//!
//! A [`ShutdownContext`] is a [`CancellationToken`] plus an optional deadline.
//! It is never created centrally: the caller of `shutdown` (host code, or a
//! [`SignalWatcher`](crate::SignalWatcher)) builds or derives it.
//!
//! ## Rules
//! - `done()` resolves when the token is cancelled **or** the deadline passes.
//! - Derived contexts share cancellation with their parent (child token) and
//!   never extend the parent's deadline.
//! - Services are expected to honor the deadline themselves; nothing is killed
//!   forcibly.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;

/// Cancellation-carrying context with an optional deadline.
#[derive(Clone, Debug)]
pub struct ShutdownContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl ShutdownContext {
    /// Context without deadline; done only if [`cancel`](Self::cancel) is called.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Wraps an existing token (no deadline).
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derives a context that is done at most `timeout` from now.
    ///
    /// A timeout too large to represent as an instant adds no deadline; the
    /// parent's deadline (if any) still applies.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => Self {
                token: self.token.child_token(),
                deadline: self.deadline,
            },
        }
    }

    /// Derives a context that is done at most at `deadline`.
    ///
    /// If this context already has an earlier deadline, that one is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline (`Some(ZERO)` once it passed).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// True once cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Underlying token, for passing into code that speaks `CancellationToken`.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Resolves when the context is cancelled or its deadline elapses.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Runs `fut` until it completes or the context is done.
    ///
    /// Returns [`ServiceError::DeadlineExceeded`] when the deadline won and
    /// [`ServiceError::Canceled`] when the token was cancelled first.
    pub async fn guard<F, T>(&self, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = T>,
    {
        tokio::select! {
            biased;
            out = fut => Ok(out),
            _ = self.done() => {
                if self.token.is_cancelled() {
                    Err(ServiceError::Canceled)
                } else {
                    Err(ServiceError::DeadlineExceeded)
                }
            }
        }
    }
}

impl Default for ShutdownContext {
    fn default() -> Self {
        Self::background()
    }
}
