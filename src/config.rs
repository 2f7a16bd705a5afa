//! # Signal-watcher configuration.
//!
//! Provides [`WatcherConfig`], the settings used by
//! [`MultiBuilder::shutdown_on_signals`](crate::MultiBuilder::shutdown_on_signals)
//! and [`SignalWatcher::with_config`](crate::SignalWatcher::with_config).
//!
//! ## Sentinel values
//! - `signals = []` → listen for every [`Signal`]
//! - `timeout = 0s` → no deadline on the forwarded shutdown context

use std::time::Duration;

use crate::signals::Signal;

/// Which signals trigger shutdown, and how long the triggered shutdown may take.
///
/// ## Field semantics
/// - `signals`: signals to listen for (empty = all)
/// - `timeout`: deadline attached to the shutdown context (`0s` = none)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Signals that trigger shutdown. Empty means every signal.
    pub signals: Vec<Signal>,

    /// Deadline for the forwarded shutdown.
    ///
    /// - `Duration::ZERO` = no deadline
    /// - `> 0` = the shutdown context is done after this long
    pub timeout: Duration,
}

impl WatcherConfig {
    /// Config for the usual termination signals with a deadline.
    ///
    /// Listens for `SIGINT` and `SIGTERM`.
    pub fn termination(timeout: Duration) -> Self {
        Self {
            signals: vec![Signal::Interrupt, Signal::Terminate],
            timeout,
        }
    }

    /// Returns the shutdown deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → shutdown context times out after `d`
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns a config with the given signal set.
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    /// Returns a config with the given timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
