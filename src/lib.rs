//! # servexec
//!
//! **servexec** starts a fixed set of long-running async services together and
//! shuts them down in reverse registration order, either on request or when the
//! process receives a termination signal.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────────────┐
//!     │  Service #0  │   │  Service #1  │   │  Service #2  │   │ SignalWatcher  │
//!     │ (data source)│   │  (consumer)  │   │    (api)     │   │ (appended last)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘   └───────┬────────┘
//!            ▼                  ▼                  ▼                   ▼
//! ┌──────────────────────────────────────────────────────────────────────────────┐
//! │  Multi (orchestrator)                                                        │
//! │  setup():    #0 → #1 → #2 → watcher          (sequential, first error aborts)│
//! │  run():      one tokio task per service, join all, collapse errors           │
//! │  shutdown(): watcher → #2 → #1 → #0          (sequential, all attempted)     │
//! └──────────────────────────────────────────────────────────────────────────────┘
//!                                                                      ▲
//!            SIGTERM ──► SignalSource ──► conduit ──► watcher.run ─────┘
//!                                                     calls multi.shutdown(ctx)
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                      |
//! |-------------------|-----------------------------------------------------------------|-----------------------------------------|
//! | **Services**      | Contract for long-running units, optional one-time setup.       | [`Service`], [`Setup`], [`ServiceRef`]  |
//! | **Orchestration** | Setup, concurrent run, reverse-order shutdown, once-only calls. | [`Multi`], [`MultiBuilder`]             |
//! | **Errors**        | One error type, per-service failures collapsed into one value.  | [`ServiceError`], [`MultiError`]        |
//! | **Signals**       | Turn OS (or manual) signals into a shutdown call.               | [`SignalWatcher`], [`SignalSource`]     |
//! | **Cancellation**  | Token plus optional deadline for `shutdown`.                    | [`ShutdownContext`]                     |
//! | **Observability** | Lifecycle hooks, `tracing` output.                              | [`MultiHooks`]                          |
//! | **Adapters**      | Closures as services, placeholder service.                      | [`ServiceFn`], [`Noop`]                 |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use servexec::{Multi, MultiHooks, Noop, Signal, WatcherConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let multi = Multi::builder()
//!         .with_service(Arc::new(Noop::new()))
//!         .with_service(Arc::new(Noop::new()))
//!         .with_hooks(MultiHooks::logging())
//!         .shutdown_on_signals(
//!             WatcherConfig::default()
//!                 .with_signals([Signal::Interrupt, Signal::Terminate])
//!                 .with_timeout(Duration::from_secs(30)),
//!         )
//!         .build();
//!
//!     // Returns once every service has stopped (after Ctrl-C / SIGTERM).
//!     multi.run().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod context;
mod core;
mod error;
mod services;
mod signals;

pub mod aggregate;

// ---- Public re-exports ----

pub use aggregate::MultiError;
pub use config::WatcherConfig;
pub use context::ShutdownContext;
pub use crate::core::{Multi, MultiBuilder, MultiHooks, ResultHook, ServiceHook};
pub use error::{BoxError, Lifecycle, ServiceError};
pub use services::{Noop, Service, ServiceFn, ServiceRef, Setup};
pub use signals::{
    ContextFactory, ManualSignals, OsSignals, Signal, SignalSource, SignalWatcher, WatcherState,
};
