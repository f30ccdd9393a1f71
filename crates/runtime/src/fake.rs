// SPDX-License-Identifier: MIT

//! In-memory [`RuntimeAdapter`] for exercising the Lifecycle Manager,
//! Connection Pool, and Reaper without a real Kubernetes cluster.

use crate::error::RuntimeError;
use crate::status::RuntimeStatus;
use crate::RuntimeAdapter;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wharf_core::{OwnerId, SessionConfig, SessionId};

#[derive(Clone)]
struct Entry {
    owner: OwnerId,
    config: SessionConfig,
    ready: bool,
}

/// Controllable fake runtime. By default sessions become ready immediately;
/// call [`FakeRuntime::set_ready_delay`] or [`FakeRuntime::set_never_ready`]
/// to model slow or stuck backing units (scenarios S1/S2 in the test plan).
#[derive(Clone)]
pub struct FakeRuntime {
    sessions: Arc<Mutex<HashMap<SessionId, Entry>>>,
    ready_delay: Arc<Mutex<Option<Duration>>>,
    never_ready: Arc<AtomicBool>,
    delete_calls: Arc<Mutex<Vec<SessionId>>>,
    healthy: Arc<AtomicBool>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ready_delay: Arc::new(Mutex::new(None)),
            never_ready: Arc::new(AtomicBool::new(false)),
            delete_calls: Arc::new(Mutex::new(Vec::new())),
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_ready_delay(&self, delay: Duration) {
        *self.ready_delay.lock() = Some(delay);
    }

    pub fn set_never_ready(&self, never: bool) {
        self.never_ready.store(never, Ordering::SeqCst);
    }

    pub fn set_unhealthy(&self) {
        self.healthy.store(false, Ordering::SeqCst);
    }

    pub fn delete_calls(&self) -> Vec<SessionId> {
        self.delete_calls.lock().clone()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.lock().contains_key(&id)
    }
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuntimeAdapter for FakeRuntime {
    async fn create_session(
        &self,
        id: SessionId,
        owner: &OwnerId,
        config: &SessionConfig,
    ) -> Result<(), RuntimeError> {
        self.sessions.lock().insert(id, Entry { owner: owner.clone(), config: config.clone(), ready: false });
        Ok(())
    }

    async fn wait_for_ready(&self, id: SessionId, timeout: Duration) -> Result<(), RuntimeError> {
        if self.never_ready.load(Ordering::SeqCst) {
            tokio::time::sleep(timeout).await;
            return Err(RuntimeError::Timeout(id));
        }
        if let Some(delay) = *self.ready_delay.lock() {
            tokio::time::sleep(delay).await;
        }
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(&id) {
            Some(entry) => {
                entry.ready = true;
                Ok(())
            }
            None => Err(RuntimeError::NotFound(id)),
        }
    }

    async fn get_status(&self, id: SessionId) -> Result<RuntimeStatus, RuntimeError> {
        let sessions = self.sessions.lock();
        let entry = sessions.get(&id).ok_or(RuntimeError::NotFound(id))?;
        Ok(RuntimeStatus {
            unit_name: Some(format!("fake-{id}")),
            volume_name: Some(format!("fake-{id}-ws")),
            internal_endpoint: entry.ready.then(|| "10.0.0.1:8000".to_string()),
            ready: entry.ready,
            ready_at: None,
            message: None,
        })
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), RuntimeError> {
        self.delete_calls.lock().push(id);
        self.sessions.lock().remove(&id);
        Ok(())
    }

    async fn get_endpoint(&self, id: SessionId) -> Result<String, RuntimeError> {
        let sessions = self.sessions.lock();
        let entry = sessions.get(&id).ok_or(RuntimeError::NotFound(id))?;
        if entry.ready {
            Ok("10.0.0.1:8000".to_string())
        } else {
            Err(RuntimeError::NotFound(id))
        }
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, RuntimeError> {
        Ok(self.sessions.lock().keys().copied().collect())
    }

    async fn health_check(&self) -> Result<(), RuntimeError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RuntimeError::Unavailable("fake runtime marked unhealthy".to_string()))
        }
    }

    async fn close(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
