// SPDX-License-Identifier: MIT

//! The Connection Pool + Health Checker (C5): a per-session outbound client
//! cache with liveness probes and idle eviction.

use crate::session_client;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use wharf_core::{AsErrorKind, ErrorKind, SessionId};
use wharf_runtime::RuntimeAdapter;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("session {0} has no known endpoint")]
    NotFound(SessionId),
    #[error("session {0} is unhealthy")]
    Unhealthy(SessionId),
}

impl AsErrorKind for PoolError {
    fn kind(&self) -> ErrorKind {
        match self {
            PoolError::NotFound(_) => ErrorKind::NotFound,
            PoolError::Unhealthy(_) => ErrorKind::Unavailable,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    endpoint: String,
    healthy: bool,
    last_probe_at_ms: u64,
    last_access_at_ms: u64,
    access_count: u64,
    consecutive_failures: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    pub total: usize,
    pub healthy: usize,
    pub total_access: u64,
}

/// Per-session client cache. Sharded conceptually by session id: a single
/// map guarded by a short-lived lock, never held across network I/O.
pub struct ConnectionPool {
    runtime: Arc<dyn RuntimeAdapter>,
    entries: Mutex<HashMap<SessionId, Entry>>,
    probe_interval: Duration,
    probe_timeout: Duration,
}

impl ConnectionPool {
    pub fn new(runtime: Arc<dyn RuntimeAdapter>, probe_interval: Duration, probe_timeout: Duration) -> Self {
        Self {
            runtime,
            entries: Mutex::new(HashMap::new()),
            probe_interval,
            probe_timeout,
        }
    }

    /// Resolve the endpoint to dial for `session_id`, creating the pool
    /// entry lazily via the Runtime Adapter and (re-)probing `/health` if
    /// the entry is stale or previously unhealthy.
    pub async fn get_client(&self, session_id: SessionId, now_ms: u64) -> Result<String, PoolError> {
        let needs_probe = {
            let entries = self.entries.lock();
            match entries.get(&session_id) {
                Some(entry) => {
                    !entry.healthy || now_ms.saturating_sub(entry.last_probe_at_ms) > self.probe_interval.as_millis() as u64
                }
                None => true,
            }
        };

        if needs_probe {
            let endpoint = match self.entries.lock().get(&session_id).map(|e| e.endpoint.clone()) {
                Some(endpoint) => endpoint,
                None => self
                    .runtime
                    .get_endpoint(session_id)
                    .await
                    .map_err(|_| PoolError::NotFound(session_id))?,
            };
            let healthy = self.probe(&endpoint).await;
            let mut entries = self.entries.lock();
            let entry = entries.entry(session_id).or_insert_with(|| Entry {
                endpoint: endpoint.clone(),
                healthy: false,
                last_probe_at_ms: 0,
                last_access_at_ms: now_ms,
                access_count: 0,
                consecutive_failures: 0,
            });
            entry.endpoint = endpoint;
            entry.last_probe_at_ms = now_ms;
            if healthy {
                entry.healthy = true;
                entry.consecutive_failures = 0;
            } else {
                entry.consecutive_failures += 1;
                // Two consecutive probe failures mark the entry unhealthy.
                if entry.consecutive_failures >= 2 {
                    entry.healthy = false;
                }
            }
        }

        let mut entries = self.entries.lock();
        let entry = entries.get_mut(&session_id).ok_or(PoolError::NotFound(session_id))?;
        entry.last_access_at_ms = entry.last_access_at_ms.max(now_ms);
        entry.access_count += 1;
        if entry.healthy {
            Ok(entry.endpoint.clone())
        } else {
            Err(PoolError::Unhealthy(session_id))
        }
    }

    async fn probe(&self, endpoint: &str) -> bool {
        session_client::request(endpoint, "GET", "/health", &[], None, self.probe_timeout)
            .await
            .map(|r| r.is_success())
            .unwrap_or(false)
    }

    pub fn remove(&self, session_id: SessionId) {
        self.entries.lock().remove(&session_id);
    }

    pub fn stats(&self) -> PoolStats {
        let entries = self.entries.lock();
        PoolStats {
            total: entries.len(),
            healthy: entries.values().filter(|e| e.healthy).count(),
            total_access: entries.values().map(|e| e.access_count).sum(),
        }
    }

    /// Remove entries whose `last_access_at` is older than `idle_timeout`.
    /// Intended to be driven by a periodic background task (default every
    /// 5 minutes, evicting entries idle more than 10 minutes).
    pub fn evict_idle(&self, idle_timeout: Duration, now_ms: u64) {
        let idle_ms = idle_timeout.as_millis() as u64;
        self.entries.lock().retain(|_, entry| now_ms.saturating_sub(entry.last_access_at_ms) < idle_ms);
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
