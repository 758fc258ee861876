//! Async orchestration around the pure router
//!
//! The [`processor::MessageProcessor`] sequences a turn end to end; the
//! [`tenant_cache::TenantCache`] keeps tenant profiles behind an explicit
//! TTL. Collaborators (record store, calendar, notifier) are injected at
//! construction, mock implementations live in [`crate::testing`].

pub mod processor;
pub mod tenant_cache;

pub use processor::{MessageProcessor, TurnOutcome};
pub use tenant_cache::TenantCache;
