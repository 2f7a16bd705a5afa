//! # Service that does nothing until told to stop.
//!
//! Useful as a placeholder and in tests.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::ShutdownContext;
use crate::error::ServiceError;
use crate::services::Service;

/// `run` resolves once `shutdown` has been called (also if it was called first).
#[derive(Debug, Default)]
pub struct Noop {
    stop: CancellationToken,
}

impl Noop {
    /// Creates a new idle service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `run` return; same as `shutdown` without a context.
    pub fn stop(&self) {
        self.stop.cancel();
    }
}

#[async_trait]
impl Service for Noop {
    fn name(&self) -> &str {
        "noop"
    }

    async fn run(&self) -> Result<(), ServiceError> {
        self.stop.cancelled().await;
        Ok(())
    }

    async fn shutdown(&self, _ctx: ShutdownContext) -> Result<(), ServiceError> {
        self.stop();
        Ok(())
    }
}
