//! # SignalWatcher: turns a signal into `shutdown` on a target.
//!
//! The watcher is itself a [`Service`] + [`Setup`], so it runs inside the same
//! lifecycle it controls (see [`MultiBuilder::shutdown_on_signals`](crate::MultiBuilder::shutdown_on_signals)).
//!
//! ## States
//! ```text
//! Idle ──setup──► Armed ──run──► Waiting ──signal──► Triggered ──shutdown──► Closed
//!                   │               │
//!                   └───shutdown────┴──────────────────────────────────────► Stopped
//! ```
//!
//! ## Rules
//! - `setup` registers the conduit once; repeated calls are no-ops.
//! - `run` has exactly one suspension point: waiting on the conduit.
//! - On a signal, `run` builds a context (deadline if configured), awaits
//!   `target.shutdown(ctx)` and returns its result.
//! - `shutdown` unregisters and closes the conduit exactly once; a blocked
//!   `run` then returns `Ok(())`. Later calls are no-ops.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{OsSignals, Signal, SignalSource};
use crate::config::WatcherConfig;
use crate::context::ShutdownContext;
use crate::error::ServiceError;
use crate::services::{Service, ServiceRef, Setup};

/// Builds the base context handed to the target's `shutdown`.
pub type ContextFactory = Arc<dyn Fn() -> ShutdownContext + Send + Sync>;

/// Observable lifecycle state of a [`SignalWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatcherState {
    /// Constructed, not registered yet.
    Idle,
    /// Conduit registered with the signal source.
    Armed,
    /// `run` is waiting on the conduit.
    Waiting,
    /// A signal arrived; shutdown is being forwarded to the target.
    Triggered,
    /// Conduit closed after a signal was handled.
    Closed,
    /// Conduit closed by an explicit `shutdown` before any signal.
    Stopped,
}

impl WatcherState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => WatcherState::Idle,
            1 => WatcherState::Armed,
            2 => WatcherState::Waiting,
            3 => WatcherState::Triggered,
            4 => WatcherState::Closed,
            _ => WatcherState::Stopped,
        }
    }
}

enum Target {
    Strong(ServiceRef),
    Weak(Weak<dyn Service>),
}

impl Target {
    fn get(&self) -> Option<ServiceRef> {
        match self {
            Target::Strong(s) => Some(Arc::clone(s)),
            Target::Weak(w) => w.upgrade(),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Service that waits for a signal and then shuts down its target.
pub struct SignalWatcher {
    target: Target,
    source: Arc<dyn SignalSource>,
    cfg: WatcherConfig,
    context: Option<ContextFactory>,
    conduit: Mutex<Option<mpsc::Sender<Signal>>>,
    inbox: Mutex<Option<mpsc::Receiver<Signal>>>,
    closed: CancellationToken,
    state: AtomicU8,
}

impl SignalWatcher {
    /// Creates a watcher for `target` fed by `source`.
    ///
    /// Listens for every signal and applies no deadline until configured.
    pub fn new(target: ServiceRef, source: Arc<dyn SignalSource>) -> Self {
        Self::with_target(Target::Strong(target), source)
    }

    /// Creates a watcher for `target` fed by process signals ([`OsSignals`]).
    ///
    /// Once armed, the process keeps tokio's handler for the watched signals
    /// even after the watcher stops: a later Ctrl-C or `SIGTERM` no longer
    /// terminates the process by default.
    pub fn os(target: ServiceRef) -> Self {
        Self::new(target, Arc::new(OsSignals::new()))
    }

    /// Watcher that does not keep its target alive.
    pub(crate) fn weak(target: Weak<dyn Service>, source: Arc<dyn SignalSource>) -> Self {
        Self::with_target(Target::Weak(target), source)
    }

    fn with_target(target: Target, source: Arc<dyn SignalSource>) -> Self {
        Self {
            target,
            source,
            cfg: WatcherConfig::default(),
            context: None,
            conduit: Mutex::new(None),
            inbox: Mutex::new(None),
            closed: CancellationToken::new(),
            state: AtomicU8::new(WatcherState::Idle as u8),
        }
    }

    /// Signals to listen for (empty = all).
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.cfg.signals = signals.into_iter().collect();
        self
    }

    /// Deadline attached to the forwarded shutdown (`0s` = none).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.timeout = timeout;
        self
    }

    /// Replaces signals and timeout at once.
    pub fn with_config(mut self, cfg: WatcherConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Base context for the forwarded shutdown (default: background).
    pub fn with_context<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> ShutdownContext + Send + Sync + 'static,
    {
        self.context = Some(Arc::new(factory));
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WatcherState {
        WatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Effective configuration.
    pub fn config(&self) -> &WatcherConfig {
        &self.cfg
    }

    fn set_state(&self, state: WatcherState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn advance(&self, from: WatcherState, to: WatcherState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn arm(&self) -> Result<(), ServiceError> {
        let mut conduit = lock(&self.conduit);
        if conduit.is_some() || self.closed.is_cancelled() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel(1);
        self.source
            .register(tx.clone(), &self.cfg.signals)
            .map_err(|error| ServiceError::Signal { error })?;
        *conduit = Some(tx);
        *lock(&self.inbox) = Some(rx);
        self.advance(WatcherState::Idle, WatcherState::Armed);

        tracing::debug!(signals = ?self.cfg.signals, "signal watcher armed");
        Ok(())
    }

    async fn forward(&self, sig: Signal) -> Result<(), ServiceError> {
        let Some(target) = self.target.get() else {
            tracing::debug!(signal = %sig, "signal watcher target already dropped");
            return Ok(());
        };
        tracing::info!(signal = %sig, target = target.name(), "signal received, shutting down");

        let base = match &self.context {
            Some(factory) => factory(),
            None => ShutdownContext::background(),
        };
        match self.cfg.deadline() {
            Some(timeout) => {
                let ctx = base.with_timeout(timeout);
                let res = target.shutdown(ctx.clone()).await;
                ctx.cancel();
                res
            }
            None => target.shutdown(base).await,
        }
    }
}

#[async_trait]
impl Service for SignalWatcher {
    fn name(&self) -> &str {
        "signal-watcher"
    }

    async fn run(&self) -> Result<(), ServiceError> {
        self.arm()?;
        let Some(mut inbox) = lock(&self.inbox).take() else {
            return Ok(());
        };
        self.advance(WatcherState::Armed, WatcherState::Waiting);

        loop {
            let received = tokio::select! {
                biased;
                _ = self.closed.cancelled() => None,
                got = inbox.recv() => got,
            };
            match received {
                None => return Ok(()),
                Some(sig) if !sig.matches(&self.cfg.signals) => {
                    tracing::debug!(signal = %sig, "ignoring unrequested signal");
                }
                Some(sig) => {
                    self.set_state(WatcherState::Triggered);
                    return self.forward(sig).await;
                }
            }
        }
    }

    async fn shutdown(&self, _ctx: ShutdownContext) -> Result<(), ServiceError> {
        let conduit = {
            let mut conduit = lock(&self.conduit);
            if self.closed.is_cancelled() {
                tracing::debug!("signal watcher already closed");
                return Ok(());
            }
            self.closed.cancel();
            conduit.take()
        };

        if let Some(tx) = conduit {
            self.source.unregister(&tx);
        }
        lock(&self.inbox).take();

        if !self.advance(WatcherState::Triggered, WatcherState::Closed) {
            self.set_state(WatcherState::Stopped);
        }
        Ok(())
    }

    fn as_setup(&self) -> Option<&dyn Setup> {
        Some(self)
    }
}

#[async_trait]
impl Setup for SignalWatcher {
    async fn setup(&self) -> Result<(), ServiceError> {
        self.arm()
    }
}
