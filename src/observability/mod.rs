//! # Observability
//!
//! Structured logging through `tracing`. Events carry their context as fields
//! (`document_id`, `op`, ...) rather than formatted into the message.

pub mod logging;

pub use logging::init_logging;
