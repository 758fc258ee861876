//! Health check HTTP server for container orchestration
//!
//! Exposes the operational status of the bot process. This is ambient
//! infrastructure only; the conversational webhook surface lives in the
//! external gateway, not here.

use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use warp::Filter;

use crate::observability::metrics::metrics;

/// HTTP health check server
pub struct HealthServer {
    bot_id: String,
    port: u16,
    store_ready: Arc<AtomicBool>,
    notifier_ready: Arc<AtomicBool>,
}

/// Single named health check result.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: Option<String>,
    pub last_check: u64,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: String,
    timestamp: u64,
    bot_id: String,
    checks: HashMap<String, HealthCheck>,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    timestamp: u64,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl HealthServer {
    /// Create new health server
    pub fn new(bot_id: String, port: u16) -> Self {
        Self {
            bot_id,
            port,
            store_ready: Arc::new(AtomicBool::new(false)),
            notifier_ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark the record store collaborator as wired and reachable.
    pub fn set_store_ready(&self, ready: bool) {
        self.store_ready.store(ready, Ordering::Relaxed);
    }

    /// Mark the notification channel as wired and reachable.
    pub fn set_notifier_ready(&self, ready: bool) {
        self.notifier_ready.store(ready, Ordering::Relaxed);
    }

    /// Start the HTTP health server
    pub async fn start(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let health_server = self.clone();
        let ready_server = self.clone();

        // GET /health - overall status with per-collaborator checks
        let health_route = warp::path("health").and(warp::get()).and_then(move || {
            let server = health_server.clone();
            async move {
                let status = server.get_health_status();
                let status_code = if status.status == "healthy" { 200 } else { 503 };
                Ok::<_, Infallible>(warp::reply::with_status(
                    warp::reply::json(&status),
                    warp::http::StatusCode::from_u16(status_code)
                        .unwrap_or(warp::http::StatusCode::INTERNAL_SERVER_ERROR),
                ))
            }
        });

        // GET /metrics - complete metrics export
        let metrics_route = warp::path("metrics").and(warp::get()).and_then(|| async {
            Ok::<_, Infallible>(warp::reply::json(&metrics().snapshot()))
        });

        // GET /ready - readiness probe
        let ready_route = warp::path("ready").and(warp::get()).and_then(move || {
            let server = ready_server.clone();
            async move {
                let ready = server.store_ready.load(Ordering::Relaxed)
                    && server.notifier_ready.load(Ordering::Relaxed);
                let response = ReadinessResponse {
                    ready,
                    timestamp: current_timestamp(),
                };
                let status_code = if ready { 200 } else { 503 };
                Ok::<_, Infallible>(warp::reply::with_status(
                    warp::reply::json(&response),
                    warp::http::StatusCode::from_u16(status_code)
                        .unwrap_or(warp::http::StatusCode::INTERNAL_SERVER_ERROR),
                ))
            }
        });

        let routes = health_route
            .or(metrics_route)
            .or(ready_route)
            .with(warp::cors().allow_any_origin());

        tracing::info!("Starting health server on port {}", self.port);

        warp::serve(routes).run(([0, 0, 0, 0], self.port)).await;

        Ok(())
    }

    fn get_health_status(&self) -> HealthStatus {
        let now = current_timestamp();
        let mut checks = HashMap::new();

        checks.insert(
            "record_store".to_string(),
            check_flag(&self.store_ready, "record store wired", "record store not wired", now),
        );
        checks.insert(
            "notifier".to_string(),
            check_flag(
                &self.notifier_ready,
                "notification channel wired",
                "notification channel not wired",
                now,
            ),
        );
        checks.insert("message_processing".to_string(), processing_check(now));

        let overall_healthy = checks.values().all(|check| check.status == "healthy");
        HealthStatus {
            status: if overall_healthy {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            timestamp: now,
            bot_id: self.bot_id.clone(),
            checks,
        }
    }
}

fn check_flag(flag: &AtomicBool, ok: &str, fail: &str, now: u64) -> HealthCheck {
    if flag.load(Ordering::Relaxed) {
        HealthCheck {
            status: "healthy".to_string(),
            message: Some(ok.to_string()),
            last_check: now,
        }
    } else {
        HealthCheck {
            status: "unhealthy".to_string(),
            message: Some(fail.to_string()),
            last_check: now,
        }
    }
}

fn processing_check(now: u64) -> HealthCheck {
    match metrics().seconds_since_last_message() {
        Some(age) => HealthCheck {
            status: "healthy".to_string(),
            message: Some(format!("last message processed {age}s ago")),
            last_check: now,
        },
        None => HealthCheck {
            status: "healthy".to_string(),
            message: Some("no messages processed yet".to_string()),
            last_check: now,
        },
    }
}
