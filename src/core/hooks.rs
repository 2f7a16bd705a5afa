//! # Lifecycle hooks.
//!
//! [`MultiHooks`] holds four optional observers called by [`Multi`](crate::Multi):
//!
//! ```text
//! run task:        on_run_started(s) ─► s.run() ─► on_run_finished(s, &res)
//! shutdown step:   on_shutdown_started(s) ─► s.shutdown(ctx) ─► on_shutdown_finished(s, &res)
//! ```
//!
//! Absent hooks are no-ops. A panicking hook is caught and logged; it never
//! changes the outcome of the lifecycle call.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::ServiceError;
use crate::services::Service;

/// Hook taking the affected service.
pub type ServiceHook = Arc<dyn Fn(&dyn Service) + Send + Sync>;

/// Hook taking the affected service and its result.
pub type ResultHook = Arc<dyn Fn(&dyn Service, &Result<(), ServiceError>) + Send + Sync>;

/// Optional observers for the orchestrator lifecycle.
///
/// ## Example
/// ```rust
/// use servexec::MultiHooks;
///
/// let hooks = MultiHooks::default()
///     .on_run_started(|s| println!("[run] {}", s.name()))
///     .on_shutdown_finished(|s, res| println!("[stopped] {} ok={}", s.name(), res.is_ok()));
/// ```
#[derive(Clone, Default)]
pub struct MultiHooks {
    run_started: Option<ServiceHook>,
    run_finished: Option<ResultHook>,
    shutdown_started: Option<ServiceHook>,
    shutdown_finished: Option<ResultHook>,
}

impl MultiHooks {
    /// Hooks that report every lifecycle point through `tracing`.
    pub fn logging() -> Self {
        Self::default()
            .on_run_started(|s| tracing::info!(service = s.name(), "service run started"))
            .on_run_finished(|s, res| match res {
                Ok(()) => tracing::info!(service = s.name(), "service run finished"),
                Err(e) => tracing::warn!(service = s.name(), error = %e, "service run failed"),
            })
            .on_shutdown_started(|s| tracing::info!(service = s.name(), "service shutdown started"))
            .on_shutdown_finished(|s, res| match res {
                Ok(()) => tracing::info!(service = s.name(), "service shutdown finished"),
                Err(e) => tracing::warn!(service = s.name(), error = %e, "service shutdown failed"),
            })
    }

    /// Called in the service's task right before `run`.
    pub fn on_run_started<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Service) + Send + Sync + 'static,
    {
        self.run_started = Some(Arc::new(f));
        self
    }

    /// Called in the service's task with the result of `run`.
    pub fn on_run_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Service, &Result<(), ServiceError>) + Send + Sync + 'static,
    {
        self.run_finished = Some(Arc::new(f));
        self
    }

    /// Called right before a service's `shutdown`.
    pub fn on_shutdown_started<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Service) + Send + Sync + 'static,
    {
        self.shutdown_started = Some(Arc::new(f));
        self
    }

    /// Called with the result of a service's `shutdown`.
    pub fn on_shutdown_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Service, &Result<(), ServiceError>) + Send + Sync + 'static,
    {
        self.shutdown_finished = Some(Arc::new(f));
        self
    }

    pub(crate) fn fire_run_started(&self, s: &dyn Service) {
        if let Some(h) = &self.run_started {
            isolate("run_started", s, || h(s));
        }
    }

    pub(crate) fn fire_run_finished(&self, s: &dyn Service, res: &Result<(), ServiceError>) {
        if let Some(h) = &self.run_finished {
            isolate("run_finished", s, || h(s, res));
        }
    }

    pub(crate) fn fire_shutdown_started(&self, s: &dyn Service) {
        if let Some(h) = &self.shutdown_started {
            isolate("shutdown_started", s, || h(s));
        }
    }

    pub(crate) fn fire_shutdown_finished(&self, s: &dyn Service, res: &Result<(), ServiceError>) {
        if let Some(h) = &self.shutdown_finished {
            isolate("shutdown_finished", s, || h(s, res));
        }
    }
}

impl fmt::Debug for MultiHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiHooks")
            .field("run_started", &self.run_started.is_some())
            .field("run_finished", &self.run_finished.is_some())
            .field("shutdown_started", &self.shutdown_started.is_some())
            .field("shutdown_finished", &self.shutdown_finished.is_some())
            .finish()
    }
}

fn isolate(hook: &'static str, s: &dyn Service, f: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        tracing::warn!(
            hook,
            service = s.name(),
            panic = %panic_message(&*panic),
            "lifecycle hook panicked"
        );
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::services::Noop;

    #[test]
    fn absent_hooks_are_noops() {
        let hooks = MultiHooks::default();
        let noop = Noop::new();
        hooks.fire_run_started(&noop);
        hooks.fire_run_finished(&noop, &Ok(()));
        hooks.fire_shutdown_started(&noop);
        hooks.fire_shutdown_finished(&noop, &Err(ServiceError::fail("x")));
    }

    #[test]
    fn hooks_see_service_and_result() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hooks = MultiHooks::default()
            .on_run_started({
                let seen = seen.clone();
                move |s: &dyn Service| seen.lock().unwrap().push(format!("start {}", s.name()))
            })
            .on_shutdown_finished({
                let seen = seen.clone();
                move |s: &dyn Service, res: &Result<(), ServiceError>| {
                    seen.lock()
                        .unwrap()
                        .push(format!("stopped {} {}", s.name(), res.is_ok()))
                }
            });

        let noop = Noop::new();
        hooks.fire_run_started(&noop);
        hooks.fire_shutdown_finished(&noop, &Err(ServiceError::fail("x")));
        assert_eq!(*seen.lock().unwrap(), ["start noop", "stopped noop false"]);
    }

    #[test]
    fn panicking_hook_is_contained() {
        let hooks = MultiHooks::default().on_run_started(|_| panic!("hook exploded"));
        hooks.fire_run_started(&Noop::new());
    }

    #[test]
    fn panic_payloads_are_rendered() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }
}
