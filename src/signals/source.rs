//! # Signal delivery boundary.
//!
//! A [`SignalSource`] pushes signal values onto a caller-provided conduit
//! (`mpsc::Sender<Signal>`) until the conduit is unregistered. Conduits are
//! identified by channel identity ([`mpsc::Sender::same_channel`]).
//!
//! Delivery never blocks: if the conduit is full the signal is dropped for that
//! conduit, the same way a buffered OS-signal channel behaves.
//!
//! ## Implementations
//! - [`OsSignals`]: `tokio::signal` listeners, one task per signal kind
//! - [`ManualSignals`]: signals raised by code (tests, embedding hosts)

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::Signal;

/// Registration boundary for signal delivery.
pub trait SignalSource: Send + Sync + 'static {
    /// Starts delivering `signals` (empty = all) onto `conduit`.
    fn register(&self, conduit: mpsc::Sender<Signal>, signals: &[Signal]) -> io::Result<()>;

    /// Stops delivery onto `conduit`. Unknown conduits are ignored.
    fn unregister(&self, conduit: &mpsc::Sender<Signal>);
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Offers `sig` to `conduit` without waiting. Returns `false` once the conduit is closed.
fn offer(conduit: &mpsc::Sender<Signal>, sig: Signal) -> bool {
    match conduit.try_send(sig) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::debug!(signal = %sig, "conduit full, signal dropped");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

struct Listener {
    conduit: mpsc::Sender<Signal>,
    stop: CancellationToken,
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// Process signals via `tokio::signal`.
///
/// Must be registered from within a tokio runtime. Note that once tokio installs
/// a handler for a signal kind, the default process action for it stays
/// replaced for the lifetime of the process.
#[derive(Default)]
pub struct OsSignals {
    listeners: Mutex<Vec<Listener>>,
}

impl OsSignals {
    /// Creates a source with no registrations.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalSource for OsSignals {
    #[cfg(unix)]
    fn register(&self, conduit: mpsc::Sender<Signal>, signals: &[Signal]) -> io::Result<()> {
        use tokio::signal::unix::signal;

        let wanted: &[Signal] = if signals.is_empty() {
            &Signal::ALL
        } else {
            signals
        };

        // Install every stream first so a failure leaves nothing half-registered.
        let mut streams = Vec::with_capacity(wanted.len());
        for sig in wanted {
            streams.push((*sig, signal(sig.kind())?));
        }

        let stop = CancellationToken::new();
        for (sig, mut stream) in streams {
            let conduit = conduit.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        got = stream.recv() => match got {
                            Some(()) if offer(&conduit, sig) => {}
                            _ => break,
                        }
                    }
                }
            });
        }

        lock(&self.listeners).push(Listener { conduit, stop });
        Ok(())
    }

    #[cfg(not(unix))]
    fn register(&self, conduit: mpsc::Sender<Signal>, signals: &[Signal]) -> io::Result<()> {
        let stop = CancellationToken::new();
        if Signal::Interrupt.matches(signals) {
            let conduit = conduit.clone();
            let stop = stop.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        got = tokio::signal::ctrl_c() => {
                            if got.is_err() || !offer(&conduit, Signal::Interrupt) {
                                break;
                            }
                        }
                    }
                }
            });
        }

        lock(&self.listeners).push(Listener { conduit, stop });
        Ok(())
    }

    fn unregister(&self, conduit: &mpsc::Sender<Signal>) {
        lock(&self.listeners).retain(|l| !l.conduit.same_channel(conduit));
    }
}

/// Signal source driven by [`ManualSignals::raise`].
///
/// Mirrors OS delivery semantics: each registration only receives the signals
/// it asked for (empty set = all), and delivery never blocks.
#[derive(Default)]
pub struct ManualSignals {
    registrations: Mutex<Vec<(mpsc::Sender<Signal>, Vec<Signal>)>>,
}

impl ManualSignals {
    /// Creates a source with no registrations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `sig` to every matching registration.
    ///
    /// Returns how many conduits accepted the signal.
    pub fn raise(&self, sig: Signal) -> usize {
        let targets: Vec<mpsc::Sender<Signal>> = lock(&self.registrations)
            .iter()
            .filter(|(_, set)| sig.matches(set))
            .map(|(tx, _)| tx.clone())
            .collect();

        targets
            .iter()
            .filter(|tx| tx.try_send(sig).is_ok())
            .count()
    }

    /// Number of live registrations.
    pub fn registrations(&self) -> usize {
        lock(&self.registrations).len()
    }
}

impl SignalSource for ManualSignals {
    fn register(&self, conduit: mpsc::Sender<Signal>, signals: &[Signal]) -> io::Result<()> {
        lock(&self.registrations).push((conduit, signals.to_vec()));
        Ok(())
    }

    fn unregister(&self, conduit: &mpsc::Sender<Signal>) {
        lock(&self.registrations).retain(|(tx, _)| !tx.same_channel(conduit));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_delivers_only_requested_signals() {
        let source = ManualSignals::new();
        let (tx, mut rx) = mpsc::channel(4);
        source.register(tx, &[Signal::Terminate]).unwrap();

        assert_eq!(source.raise(Signal::Interrupt), 0);
        assert_eq!(source.raise(Signal::Terminate), 1);
        assert_eq!(rx.recv().await, Some(Signal::Terminate));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn manual_empty_set_receives_everything() {
        let source = ManualSignals::new();
        let (tx, mut rx) = mpsc::channel(4);
        source.register(tx, &[]).unwrap();

        source.raise(Signal::Hangup);
        assert_eq!(rx.recv().await, Some(Signal::Hangup));
    }

    #[tokio::test]
    async fn manual_unregister_stops_delivery() {
        let source = ManualSignals::new();
        let (tx, _rx) = mpsc::channel(1);
        source.register(tx.clone(), &[]).unwrap();
        assert_eq!(source.registrations(), 1);

        source.unregister(&tx);
        assert_eq!(source.registrations(), 0);
        assert_eq!(source.raise(Signal::Interrupt), 0);
    }

    #[tokio::test]
    async fn full_conduit_drops_instead_of_blocking() {
        let source = ManualSignals::new();
        let (tx, _rx) = mpsc::channel(1);
        source.register(tx, &[]).unwrap();

        assert_eq!(source.raise(Signal::User1), 1);
        assert_eq!(source.raise(Signal::User1), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn os_register_and_unregister() {
        let source = OsSignals::new();
        let (tx, _rx) = mpsc::channel(1);
        source.register(tx.clone(), &[Signal::User2]).unwrap();
        assert_eq!(lock(&source.listeners).len(), 1);

        source.unregister(&tx);
        assert!(lock(&source.listeners).is_empty());
    }
}
