//! Orchestration core.
//!
//! The public API from this module is [`Multi`] (the orchestrator), its
//! [`MultiBuilder`] and the [`MultiHooks`] observers.
//!
//! Internal modules:
//! - [`multi`]: setup/run/shutdown across the registered services;
//! - [`builder`]: fixed service list plus signal-watcher wiring;
//! - [`hooks`]: optional lifecycle observers, panic-isolated.

mod builder;
mod hooks;
mod multi;

pub use builder::MultiBuilder;
pub use hooks::{MultiHooks, ResultHook, ServiceHook};
pub use multi::Multi;
