//! # Observability
//!
//! Structured logging through the `tracing` ecosystem. Capture and push
//! activity is recorded in spans created by [`capture_span!`](crate::capture_span)
//! and [`push_span!`](crate::push_span).

pub mod logging;

pub use logging::init_logging;
