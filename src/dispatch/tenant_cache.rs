//! Tenant profile cache
//!
//! Tenant branding changes rarely but is read on every inbound message, so
//! the dispatcher keeps profiles behind a TTL. The cache is an explicit,
//! injected value owned by the dispatcher, not a global, and it exposes
//! `invalidate` for the moment a tenant edits their settings.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::router::input::TenantProfile;

struct CachedProfile {
    profile: TenantProfile,
    fetched_at: Instant,
}

/// TTL cache keyed by tenant id.
pub struct TenantCache {
    ttl: Duration,
    inner: RwLock<HashMap<Uuid, CachedProfile>>,
}

impl TenantCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// A profile no older than the TTL, or `None` (expired entries are
    /// left in place; `insert` overwrites them).
    pub async fn get(&self, tenant_id: Uuid) -> Option<TenantProfile> {
        let cache = self.inner.read().await;
        cache.get(&tenant_id).and_then(|entry| {
            if entry.fetched_at.elapsed() < self.ttl {
                Some(entry.profile.clone())
            } else {
                None
            }
        })
    }

    pub async fn insert(&self, profile: TenantProfile) {
        let mut cache = self.inner.write().await;
        cache.insert(
            profile.id,
            CachedProfile {
                profile,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop one tenant so the next message reloads it.
    pub async fn invalidate(&self, tenant_id: Uuid) {
        self.inner.write().await.remove(&tenant_id);
    }

    /// Drop every entry past its TTL. Callable from a maintenance tick;
    /// correctness never depends on it.
    pub async fn purge_expired(&self) {
        let mut cache = self.inner.write().await;
        cache.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
