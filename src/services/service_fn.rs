//! # Function-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] turns plain closures into a [`Service`] + [`Setup`] without a
//! dedicated type. Every call produces a fresh future; share state across the
//! closures explicitly (e.g. an `Arc<...>` or a `CancellationToken` captured by
//! both `run` and `shutdown`).
//!
//! ## Example
//! ```rust
//! use servexec::{ServiceFn, ServiceError, ShutdownContext};
//! use tokio_util::sync::CancellationToken;
//!
//! let stop = CancellationToken::new();
//! let (run_stop, shut_stop) = (stop.clone(), stop);
//!
//! let svc = ServiceFn::arc(
//!     "worker",
//!     move || {
//!         let stop = run_stop.clone();
//!         async move {
//!             stop.cancelled().await;
//!             Ok(())
//!         }
//!     },
//!     move |_ctx: ShutdownContext| {
//!         shut_stop.cancel();
//!         async { Ok::<_, ServiceError>(()) }
//!     },
//! );
//! assert_eq!(servexec::Service::name(svc.as_ref()), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::ShutdownContext;
use crate::error::ServiceError;
use crate::services::{Service, Setup};

type SetupFn = Box<dyn Fn() -> BoxFuture<'static, Result<(), ServiceError>> + Send + Sync>;
type RunFn = Box<dyn Fn() -> BoxFuture<'static, Result<(), ServiceError>> + Send + Sync>;
type ShutdownFn =
    Box<dyn Fn(ShutdownContext) -> BoxFuture<'static, Result<(), ServiceError>> + Send + Sync>;

/// Closure-backed service.
///
/// `setup` is optional and defaults to a no-op.
pub struct ServiceFn {
    name: Cow<'static, str>,
    on_setup: Option<SetupFn>,
    on_run: RunFn,
    on_shutdown: ShutdownFn,
}

impl ServiceFn {
    /// Creates a service from a run closure and a shutdown closure.
    pub fn new<R, RFut, S, SFut>(name: impl Into<Cow<'static, str>>, run: R, shutdown: S) -> Self
    where
        R: Fn() -> RFut + Send + Sync + 'static,
        RFut: Future<Output = Result<(), ServiceError>> + Send + 'static,
        S: Fn(ShutdownContext) -> SFut + Send + Sync + 'static,
        SFut: Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            on_setup: None,
            on_run: Box::new(move || Box::pin(run())),
            on_shutdown: Box::new(move |ctx| Box::pin(shutdown(ctx))),
        }
    }

    /// Same as [`ServiceFn::new`], returned as a shared handle.
    pub fn arc<R, RFut, S, SFut>(name: impl Into<Cow<'static, str>>, run: R, shutdown: S) -> Arc<Self>
    where
        R: Fn() -> RFut + Send + Sync + 'static,
        RFut: Future<Output = Result<(), ServiceError>> + Send + 'static,
        S: Fn(ShutdownContext) -> SFut + Send + Sync + 'static,
        SFut: Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        Arc::new(Self::new(name, run, shutdown))
    }

    /// Attaches a setup closure.
    pub fn with_setup<F, Fut>(mut self, setup: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        self.on_setup = Some(Box::new(move || Box::pin(setup())));
        self
    }
}

#[async_trait]
impl Service for ServiceFn {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), ServiceError> {
        (self.on_run)().await
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), ServiceError> {
        (self.on_shutdown)(ctx).await
    }

    fn as_setup(&self) -> Option<&dyn Setup> {
        Some(self)
    }
}

#[async_trait]
impl Setup for ServiceFn {
    async fn setup(&self) -> Result<(), ServiceError> {
        match &self.on_setup {
            Some(f) => f().await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(runs: Arc<AtomicUsize>, shutdowns: Arc<AtomicUsize>) -> ServiceFn {
        ServiceFn::new(
            "counting",
            move || {
                runs.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            move |_ctx| {
                shutdowns.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
        )
    }

    #[tokio::test]
    async fn closures_are_invoked() {
        let runs = Arc::new(AtomicUsize::new(0));
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let svc = counting(runs.clone(), shutdowns.clone());

        svc.run().await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        svc.shutdown(ShutdownContext::background()).await.unwrap();
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(svc.name(), "counting");
    }

    #[tokio::test]
    async fn missing_setup_is_a_noop() {
        let svc = counting(Arc::default(), Arc::default());
        let setup = svc.as_setup().expect("ServiceFn advertises setup");
        assert!(setup.setup().await.is_ok());
    }

    #[tokio::test]
    async fn setup_error_is_returned() {
        let svc = counting(Arc::default(), Arc::default())
            .with_setup(|| async { Err(ServiceError::fail("no config")) });
        let err = svc.setup().await.unwrap_err();
        assert_eq!(err.to_string(), "no config");
    }
}
