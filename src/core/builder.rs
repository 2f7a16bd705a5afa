use std::sync::{Arc, Weak};

use crate::{
    config::WatcherConfig,
    core::{Multi, MultiHooks},
    services::{Service, ServiceRef},
    signals::{OsSignals, SignalSource, SignalWatcher},
};

/// Builder for a [`Multi`] with optional signal-driven shutdown.
///
/// Services are registered in order; signal watchers are appended after them
/// so that they are the first to be shut down. The built list can no longer
/// change.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use servexec::{Multi, MultiHooks, Noop, WatcherConfig};
///
/// let multi = Multi::builder()
///     .with_service(Arc::new(Noop::new()))
///     .with_hooks(MultiHooks::logging())
///     .shutdown_on_signals(WatcherConfig::termination(Duration::from_secs(10)))
///     .build();
/// assert_eq!(multi.names(), ["noop", "signal-watcher"]);
/// ```
#[derive(Default)]
pub struct MultiBuilder {
    services: Vec<ServiceRef>,
    hooks: MultiHooks,
    watchers: Vec<(Arc<dyn SignalSource>, WatcherConfig)>,
}

impl MultiBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one service.
    pub fn with_service(mut self, service: ServiceRef) -> Self {
        self.services.push(service);
        self
    }

    /// Registers several services, in iteration order.
    pub fn with_services(mut self, services: impl IntoIterator<Item = ServiceRef>) -> Self {
        self.services.extend(services);
        self
    }

    /// Sets lifecycle hooks.
    pub fn with_hooks(mut self, hooks: MultiHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Shuts the built orchestrator down when a process signal arrives.
    ///
    /// Appends a [`SignalWatcher`] fed by [`OsSignals`] to the service list.
    ///
    /// The watched signals stay handled by tokio for the rest of the process,
    /// also after the watcher has stopped; a second Ctrl-C or `SIGTERM` is then
    /// ignored instead of killing the process.
    pub fn shutdown_on_signals(self, cfg: WatcherConfig) -> Self {
        self.shutdown_on_signals_from(Arc::new(OsSignals::new()), cfg)
    }

    /// Same as [`shutdown_on_signals`](Self::shutdown_on_signals) with any signal source.
    pub fn shutdown_on_signals_from(
        mut self,
        source: Arc<dyn SignalSource>,
        cfg: WatcherConfig,
    ) -> Self {
        self.watchers.push((source, cfg));
        self
    }

    /// Builds the orchestrator.
    ///
    /// Watchers hold the orchestrator weakly, so dropping the last `Arc<Multi>`
    /// frees everything.
    pub fn build(self) -> Arc<Multi> {
        let Self {
            mut services,
            hooks,
            watchers,
        } = self;

        Arc::new_cyclic(|me: &Weak<Multi>| {
            for (source, cfg) in watchers {
                let target: Weak<dyn Service> = me.clone();
                let watcher = SignalWatcher::weak(target, source).with_config(cfg);
                services.push(Arc::new(watcher));
            }
            Multi::from_parts(services, hooks)
        })
    }
}
