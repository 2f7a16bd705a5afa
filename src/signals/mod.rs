//! # OS signals as a shutdown trigger.
//!
//! - [`Signal`] - portable signal identifiers
//! - [`SignalSource`] - registration boundary (`register` / `unregister` a conduit)
//! - [`OsSignals`] - real delivery via `tokio::signal`
//! - [`ManualSignals`] - in-process source for tests and embedding
//! - [`SignalWatcher`] - service that forwards a received signal as `shutdown`
//!
//! ```text
//!   OsSignals / ManualSignals
//!            │ register(conduit, signals)
//!            ▼
//!   conduit (mpsc, capacity 1) ──► SignalWatcher::run ──► target.shutdown(ctx)
//!            ▲                                               (ctx with optional deadline)
//!            └── SignalWatcher::shutdown: unregister + close
//! ```

mod signal;
mod source;
mod watcher;

pub use signal::Signal;
pub use source::{ManualSignals, OsSignals, SignalSource};
pub use watcher::{ContextFactory, SignalWatcher, WatcherState};
