//! Observability for backup-sync
//!
//! Structured logging configured from the environment, plus span macros for
//! sync runs and API calls.

pub mod logging;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, LogFormat};

// Span macros for structured logging
pub use logging::{api_span, sync_span};
