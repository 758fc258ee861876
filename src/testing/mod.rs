//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for exercising the dispatcher
//! without external dependencies like the table service or a calendar
//! provider.

pub mod mocks;

pub use mocks::*;
