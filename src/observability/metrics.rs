//! Thread-safe metrics collection system
//!
//! Provides atomic counters and mutex-protected collections for tracking
//! operational statistics across message processing and booking operations.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Global metrics collector instance
pub static METRICS: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// Get reference to global metrics collector
pub fn metrics() -> &'static MetricsCollector {
    &METRICS
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Thread-safe metrics collector using atomics and mutexes
pub struct MetricsCollector {
    // Conversation metrics (atomic for high frequency)
    messages_received: AtomicU64,
    replies_sent: AtomicU64,
    leads_created: AtomicU64,
    validation_failures: AtomicU64,
    router_errors: AtomicU64,

    // Booking metrics
    bookings_created: AtomicU64,
    bookings_cancelled: AtomicU64,
    hot_leads: AtomicU64,

    // Processing times in milliseconds (mutex protected)
    processing_times: Mutex<Vec<u64>>,

    // Per-action counts (mutex protected for the snapshot map)
    action_counts: Mutex<HashMap<String, u64>>,

    // Lifecycle
    started_at: AtomicU64,
    last_message_at: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            replies_sent: AtomicU64::new(0),
            leads_created: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            router_errors: AtomicU64::new(0),
            bookings_created: AtomicU64::new(0),
            bookings_cancelled: AtomicU64::new(0),
            hot_leads: AtomicU64::new(0),
            processing_times: Mutex::new(Vec::new()),
            action_counts: Mutex::new(HashMap::new()),
            started_at: AtomicU64::new(now_unix()),
            last_message_at: AtomicU64::new(0),
        }
    }

    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.last_message_at.store(now_unix(), Ordering::Relaxed);
    }

    pub fn record_reply_sent(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lead_created(&self) {
        self.leads_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_router_error(&self) {
        self.router_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_booking_created(&self) {
        self.bookings_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_booking_cancelled(&self) {
        self.bookings_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_hot_lead(&self) {
        self.hot_leads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_action(&self, action: &str) {
        if let Ok(mut counts) = self.action_counts.lock() {
            *counts.entry(action.to_string()).or_insert(0) += 1;
        }
    }

    pub fn record_processing_time_ms(&self, millis: u64) {
        if let Ok(mut times) = self.processing_times.lock() {
            times.push(millis);
            // bound memory: keep the most recent 1000 samples
            let len = times.len();
            if len > 1000 {
                times.drain(0..len - 1000);
            }
        }
    }

    /// Seconds since the last inbound message, `None` before the first.
    pub fn seconds_since_last_message(&self) -> Option<u64> {
        let last = self.last_message_at.load(Ordering::Relaxed);
        if last == 0 {
            None
        } else {
            Some(now_unix().saturating_sub(last))
        }
    }

    /// Point-in-time snapshot for the metrics endpoint.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (avg_processing_ms, samples) = match self.processing_times.lock() {
            Ok(times) if !times.is_empty() => {
                let sum: u64 = times.iter().sum();
                (sum / times.len() as u64, times.len())
            }
            _ => (0, 0),
        };

        let action_counts = self
            .action_counts
            .lock()
            .map(|counts| counts.clone())
            .unwrap_or_default();

        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            leads_created: self.leads_created.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            router_errors: self.router_errors.load(Ordering::Relaxed),
            bookings_created: self.bookings_created.load(Ordering::Relaxed),
            bookings_cancelled: self.bookings_cancelled.load(Ordering::Relaxed),
            hot_leads: self.hot_leads.load(Ordering::Relaxed),
            avg_processing_ms,
            processing_samples: samples,
            action_counts,
            uptime_secs: now_unix().saturating_sub(self.started_at.load(Ordering::Relaxed)),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of all counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub replies_sent: u64,
    pub leads_created: u64,
    pub validation_failures: u64,
    pub router_errors: u64,
    pub bookings_created: u64,
    pub bookings_cancelled: u64,
    pub hot_leads: u64,
    pub avg_processing_ms: u64,
    pub processing_samples: usize,
    pub action_counts: HashMap<String, u64>,
    pub uptime_secs: u64,
}
