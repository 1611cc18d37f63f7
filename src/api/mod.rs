//! accsyn API layer
//!
//! This module provides the session abstraction used by the sync flow, the
//! query filter builder and the REST client talking to the service.

pub mod client;
pub mod query;
pub mod session;

pub use client::{AccsynClient, AccsynConfig};
pub use query::{EntityKind, Query};
pub use session::{ApiError, ApiSession, Record};
