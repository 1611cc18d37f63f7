//! Testing utilities and mock implementations
//!
//! This module provides a mock accsyn session so the sync flow can be
//! exercised without network access.

pub mod mocks;

pub use mocks::*;
