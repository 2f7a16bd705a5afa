//! # Service contracts and trivial adapters.
//!
//! - [`Service`] - async `run` + cooperative `shutdown`
//! - [`Setup`] - optional one-time initialization before `run`
//! - [`ServiceRef`] - shared handle (`Arc<dyn Service>`)
//! - [`ServiceFn`] - closures as a service
//! - [`Noop`] - placeholder that runs until shut down

mod noop;
mod service;
mod service_fn;

pub use noop::Noop;
pub use service::{Service, ServiceRef, Setup};
pub use service_fn::ServiceFn;
