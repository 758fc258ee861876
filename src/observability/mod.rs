//! Observability: logging, metrics and health endpoints
//!
//! Ambient monitoring for the bot process. Structured logs via tracing,
//! a global atomic metrics collector, and a small warp server for
//! health/readiness probes and metrics export.

pub mod health;
pub mod logging;
pub mod metrics;

// Re-export for convenience
pub use health::HealthServer;
pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{metrics, MetricsCollector, MetricsSnapshot};
