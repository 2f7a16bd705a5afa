//! # Multi: runs a fixed set of services and tears them down in reverse.
//!
//! The [`Multi`] owns an ordered list of services and drives three phases:
//!
//! ```text
//! setup():    for s in services (in order)  ─► s.setup()?          (first error aborts)
//!
//! run():      claim run flag (else RepeatedCall)
//!             setup() if not done yet                              (error: nothing spawned)
//!             launch gate ─► Started:  JoinSet.spawn(task(i)) per service
//!                          └► Suppressed (shutdown won): spawn nothing
//!             task(i): on_run_started ─► s.run() ─► on_run_finished ─► results[i]
//!             join all ─► collapse(results)
//!
//! shutdown(): claim shutdown flag (else RepeatedCall)
//!             launch gate ─► Suppressed: nothing was started, Ok(())
//!                          └► Started:  for i in (0..n).rev() sequentially:
//!                                 on_shutdown_started ─► s.shutdown(ctx) ─► on_shutdown_finished
//!             collapse(results)
//! ```
//!
//! ## Rules
//! - `setup` runs at most once; calling it a second time panics.
//! - `run` and `shutdown` succeed at most once each; repeats get
//!   [`ServiceError::RepeatedCall`].
//! - Whichever of `run`/`shutdown` reaches the launch gate first decides whether
//!   any run task exists; `shutdown` only addresses services that were started.
//! - A failing `run` never stops siblings; a failing `shutdown` never stops the
//!   reverse walk. All failures are aggregated in registration order.
//! - The service list is fixed at construction.

use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinSet;

use super::builder::MultiBuilder;
use super::hooks::{MultiHooks, panic_message};
use crate::aggregate::collapse;
use crate::context::ShutdownContext;
use crate::error::{Lifecycle, ServiceError};
use crate::services::{Service, ServiceRef, Setup};

/// Registered service, tagged once with whether it supports [`Setup`].
struct Member {
    service: ServiceRef,
    setup: bool,
}

impl Member {
    fn new(service: ServiceRef) -> Self {
        let setup = service.as_setup().is_some();
        Self { service, setup }
    }
}

/// Outcome of the run/shutdown race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Launch {
    Started,
    Suppressed,
}

/// Runs a fixed, ordered set of services together.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use servexec::{Multi, Noop, ServiceRef, ShutdownContext};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let services: Vec<ServiceRef> = vec![Arc::new(Noop::new()), Arc::new(Noop::new())];
///     let multi = Arc::new(Multi::new(services));
///
///     let stopper = Arc::clone(&multi);
///     tokio::spawn(async move {
///         tokio::time::sleep(Duration::from_millis(10)).await;
///         stopper.shutdown(ShutdownContext::background()).await
///     });
///
///     multi.run().await?;
///     Ok(())
/// }
/// ```
pub struct Multi {
    members: Vec<Member>,
    hooks: MultiHooks,
    setup_done: AtomicBool,
    run_claimed: AtomicBool,
    shutdown_claimed: AtomicBool,
    launch: OnceLock<Launch>,
}

impl Multi {
    /// Creates an orchestrator over `services`, in registration order.
    pub fn new(services: impl IntoIterator<Item = ServiceRef>) -> Self {
        Self::from_parts(services, MultiHooks::default())
    }

    /// Starts a [`MultiBuilder`] (needed for signal wiring).
    pub fn builder() -> MultiBuilder {
        MultiBuilder::new()
    }

    pub(crate) fn from_parts(
        services: impl IntoIterator<Item = ServiceRef>,
        hooks: MultiHooks,
    ) -> Self {
        Self {
            members: services.into_iter().map(Member::new).collect(),
            hooks,
            setup_done: AtomicBool::new(false),
            run_claimed: AtomicBool::new(false),
            shutdown_claimed: AtomicBool::new(false),
            launch: OnceLock::new(),
        }
    }

    /// Replaces the lifecycle hooks.
    pub fn with_hooks(mut self, hooks: MultiHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if no service is registered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Registered services, in registration order.
    pub fn services(&self) -> impl Iterator<Item = &ServiceRef> {
        self.members.iter().map(|m| &m.service)
    }

    /// Names of the registered services, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.service.name()).collect()
    }

    /// Calls `setup` on every service that supports it, in order.
    ///
    /// Called automatically by [`run`](Self::run); call it directly only to
    /// surface setup failures before running.
    ///
    /// # Panics
    /// If setup already ran (directly or through `run`). No valid caller does this.
    pub async fn setup(&self) -> Result<(), ServiceError> {
        if self.setup_done.swap(true, Ordering::AcqRel) {
            panic!("logic error: do not call setup twice");
        }
        self.setup_members().await
    }

    async fn setup_members(&self) -> Result<(), ServiceError> {
        for (index, m) in self.members.iter().enumerate().filter(|(_, m)| m.setup) {
            let Some(s) = m.service.as_setup() else {
                continue;
            };
            tracing::debug!(service = m.service.name(), index, "setting up service");
            if let Err(e) = s.setup().await {
                tracing::debug!(service = m.service.name(), index, error = %e, "setup failed");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Runs every service concurrently until all of them have returned.
    ///
    /// Runs setup first if it has not happened yet. Returns the aggregated run
    /// results, or [`ServiceError::RepeatedCall`] on a second call. If
    /// [`shutdown`](Self::shutdown) got there first, nothing is spawned and the
    /// result is `Ok(())`.
    pub async fn run(&self) -> Result<(), ServiceError> {
        if self.run_claimed.swap(true, Ordering::AcqRel) {
            return Err(ServiceError::RepeatedCall { op: Lifecycle::Run });
        }
        if self
            .setup_done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.setup_members().await?;
        }

        let mut set = JoinSet::new();
        let launch = *self.launch.get_or_init(|| {
            self.spawn_members(&mut set);
            Launch::Started
        });
        if launch == Launch::Suppressed {
            tracing::debug!("shutdown already requested, no service started");
            return Ok(());
        }

        let mut results: Vec<Option<Result<(), ServiceError>>> =
            (0..self.members.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, res)) => results[index] = Some(res),
                Err(e) => tracing::warn!(error = %e, "service task did not complete"),
            }
        }

        collapse(
            results
                .into_iter()
                .map(|res| res.unwrap_or(Err(ServiceError::Canceled))),
        )
    }

    fn spawn_members(&self, set: &mut JoinSet<(usize, Result<(), ServiceError>)>) {
        for (index, m) in self.members.iter().enumerate() {
            let service = ServiceRef::clone(&m.service);
            let hooks = self.hooks.clone();
            tracing::debug!(service = service.name(), index, "spawning service");
            set.spawn(run_member(index, service, hooks));
        }
    }

    /// Shuts services down one at a time, last registered first.
    ///
    /// Every service's `shutdown` is attempted even if an earlier one failed.
    /// Returns the aggregated shutdown results, or [`ServiceError::RepeatedCall`]
    /// on a second call. A no-op if `run` never started any service.
    pub async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), ServiceError> {
        if self.shutdown_claimed.swap(true, Ordering::AcqRel) {
            return Err(ServiceError::RepeatedCall {
                op: Lifecycle::Shutdown,
            });
        }
        if *self.launch.get_or_init(|| Launch::Suppressed) == Launch::Suppressed {
            tracing::debug!("shutdown before run, nothing to stop");
            return Ok(());
        }

        let mut results: Vec<Result<(), ServiceError>> =
            (0..self.members.len()).map(|_| Ok(())).collect();
        for index in (0..self.members.len()).rev() {
            let service = self.members[index].service.as_ref();
            tracing::debug!(service = service.name(), index, "shutting down service");

            self.hooks.fire_shutdown_started(service);
            let res = service.shutdown(ctx.clone()).await;
            if let Err(e) = &res {
                tracing::warn!(service = service.name(), index, error = %e, "shutdown failed");
            }
            self.hooks.fire_shutdown_finished(service, &res);
            results[index] = res;
        }
        collapse(results)
    }
}

async fn run_member(
    index: usize,
    service: ServiceRef,
    hooks: MultiHooks,
) -> (usize, Result<(), ServiceError>) {
    hooks.fire_run_started(service.as_ref());
    let res = match AssertUnwindSafe(service.run()).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(ServiceError::Panicked {
            service: service.name().to_string(),
            message: panic_message(&*panic),
        }),
    };
    match &res {
        Ok(()) => tracing::debug!(service = service.name(), index, "service finished"),
        Err(e) => tracing::debug!(service = service.name(), index, error = %e, "service failed"),
    }
    hooks.fire_run_finished(service.as_ref(), &res);
    (index, res)
}

impl std::fmt::Debug for Multi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Multi")
            .field("services", &self.names())
            .field("hooks", &self.hooks)
            .field("launch", &self.launch.get())
            .finish()
    }
}

#[async_trait]
impl Service for Multi {
    fn name(&self) -> &str {
        "multi"
    }

    async fn run(&self) -> Result<(), ServiceError> {
        Multi::run(self).await
    }

    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), ServiceError> {
        Multi::shutdown(self, ctx).await
    }

    fn as_setup(&self) -> Option<&dyn Setup> {
        Some(self)
    }
}

#[async_trait]
impl Setup for Multi {
    async fn setup(&self) -> Result<(), ServiceError> {
        Multi::setup(self).await
    }
}
