//! Observability wiring for the service.

mod tracing_init;

pub use tracing_init::init;
