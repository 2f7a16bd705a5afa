//! # Service abstraction.
//!
//! A [`Service`] is a long-running unit: [`run`](Service::run) resolves when the
//! service finishes on its own or after [`shutdown`](Service::shutdown) asked it
//! to stop. The shared handle type is [`ServiceRef`].
//!
//! Services that need one-time initialization also implement [`Setup`] and
//! advertise it through [`Service::as_setup`]. The orchestrator queries that
//! capability once, at registration.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::ShutdownContext;
use crate::error::ServiceError;

/// Shared handle to a service.
pub type ServiceRef = Arc<dyn Service>;

/// # Long-running, cooperatively stoppable unit.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use servexec::{Service, ServiceError, ShutdownContext};
///
/// struct Ticker {
///     stop: CancellationToken,
/// }
///
/// #[async_trait]
/// impl Service for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(&self) -> Result<(), ServiceError> {
///         loop {
///             tokio::select! {
///                 _ = self.stop.cancelled() => return Ok(()),
///                 _ = tokio::time::sleep(std::time::Duration::from_secs(1)) => {}
///             }
///         }
///     }
///
///     async fn shutdown(&self, _ctx: ShutdownContext) -> Result<(), ServiceError> {
///         self.stop.cancel();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Human-readable name (for logs and hooks).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs until a natural or fatal stop, or until `shutdown` was invoked.
    async fn run(&self) -> Result<(), ServiceError>;

    /// Asks `run` to return promptly.
    ///
    /// Implementations should not outlive the context's deadline when it has one.
    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), ServiceError>;

    /// Returns `Some(self)` for services that also implement [`Setup`].
    fn as_setup(&self) -> Option<&dyn Setup> {
        None
    }
}

/// # One-time initialization before `run`.
///
/// Called exactly once, strictly before [`Service::run`]; `run` is not started
/// until `setup` has resolved. Implementors must also override
/// [`Service::as_setup`] to return `Some(self)`.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use async_trait::async_trait;
/// use servexec::{Service, ServiceError, Setup, ShutdownContext};
///
/// #[derive(Default)]
/// struct Cache {
///     warm: AtomicBool,
/// }
///
/// #[async_trait]
/// impl Service for Cache {
///     fn name(&self) -> &str { "cache" }
///
///     async fn run(&self) -> Result<(), ServiceError> {
///         assert!(self.warm.load(Ordering::Acquire));
///         Ok(())
///     }
///
///     async fn shutdown(&self, _ctx: ShutdownContext) -> Result<(), ServiceError> {
///         Ok(())
///     }
///
///     // Without this the orchestrator never calls `setup`.
///     fn as_setup(&self) -> Option<&dyn Setup> {
///         Some(self)
///     }
/// }
///
/// #[async_trait]
/// impl Setup for Cache {
///     async fn setup(&self) -> Result<(), ServiceError> {
///         self.warm.store(true, Ordering::Release);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Setup: Service {
    /// Prepares the service; a failure aborts the whole orchestrator.
    async fn setup(&self) -> Result<(), ServiceError>;
}
