// SPDX-License-Identifier: MIT

//! The Session Lifecycle Manager (C4): the only component that drives a
//! [`Session`]'s state machine. Create, Get, List, Delete all funnel
//! through here so the Registry's records and the Runtime Adapter's
//! backing units never drift out of lockstep for long.

use crate::broker::Broker;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use wharf_core::{AsErrorKind, ErrorKind, Event, OwnerId, Session, SessionConfig, SessionId, SessionState};
use wharf_runtime::RuntimeAdapter;
use wharf_storage::{Page, RegistryError, SessionRegistry};

/// Budget given to a newly created session to become ready before the
/// Lifecycle Manager gives up and marks it `Error`.
pub const READY_BUDGET: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("runtime error provisioning session {0}: {1}")]
    Internal(SessionId, String),
}

impl AsErrorKind for LifecycleError {
    fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::NotFound(_) => ErrorKind::NotFound,
            LifecycleError::Internal(_, _) => ErrorKind::Internal,
        }
    }
}

impl From<RegistryError> for LifecycleError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => LifecycleError::NotFound(id),
            RegistryError::AlreadyExists(id) => LifecycleError::Internal(id, err.to_string()),
            RegistryError::Durable(_) => LifecycleError::Internal(SessionId::new(), err.to_string()),
        }
    }
}

use wharf_core::{Clock, SessionStatus};
use wharf_runtime::RuntimeStatus;

fn into_session_status(status: RuntimeStatus) -> SessionStatus {
    SessionStatus {
        unit_name: status.unit_name,
        volume_name: status.volume_name,
        internal_endpoint: status.internal_endpoint,
        ready: status.ready,
        ready_at: status.ready_at,
        message: status.message,
    }
}

pub struct LifecycleManager<C: Clock> {
    registry: Arc<SessionRegistry>,
    runtime: Arc<dyn RuntimeAdapter>,
    broker: Broker<Event>,
    clock: C,
    ready_budget: Duration,
}

impl<C: Clock> LifecycleManager<C> {
    pub fn new(registry: Arc<SessionRegistry>, runtime: Arc<dyn RuntimeAdapter>, broker: Broker<Event>, clock: C) -> Self {
        Self { registry, runtime, broker, clock, ready_budget: READY_BUDGET }
    }

    pub fn with_ready_budget(mut self, budget: Duration) -> Self {
        self.ready_budget = budget;
        self
    }

    /// Insert a `Creating` record, ask the Runtime Adapter to provision the
    /// backing unit, and (on acceptance) spawn a background task to wait
    /// for readiness. Returns as soon as provisioning is *accepted*, not
    /// once the session is actually serving traffic.
    pub async fn create(&self, owner: OwnerId, config: SessionConfig) -> Result<Session, LifecycleError> {
        let now_ms = self.clock.epoch_ms();
        let mut session = Session::new(owner.clone(), config.clone(), now_ms);
        self.registry.create(session.clone())?;

        if let Err(err) = self.runtime.create_session(session.id, &owner, &config).await {
            session.transition(SessionState::Error, now_ms);
            session.status.message = Some(err.to_string());
            let _ = self.registry.update(session.clone());
            self.broker.publish(Event::SessionUpdated { session: session.clone() });
            return Err(LifecycleError::Internal(session.id, err.to_string()));
        }

        self.broker.publish(Event::SessionCreated { session: session.clone() });
        self.spawn_readiness_wait(session.id);
        Ok(session)
    }

    fn spawn_readiness_wait(&self, id: SessionId) {
        let registry = self.registry.clone();
        let runtime = self.runtime.clone();
        let broker = self.broker.clone();
        let clock = self.clock.clone();
        let budget = self.ready_budget;
        tokio::spawn(async move {
            let now_ms = clock.epoch_ms();
            let Ok(mut session) = registry.get_unchecked(id) else { return };

            match runtime.wait_for_ready(id, budget).await {
                Ok(()) => {
                    let status = runtime.get_status(id).await.unwrap_or_default();
                    session.status = into_session_status(status);
                    session.status.ready = true;
                    session.status.ready_at = Some(now_ms);
                    session.transition(SessionState::Running, now_ms);
                    info!(session = %id, "session became ready");
                }
                Err(err) => {
                    session.transition(SessionState::Error, now_ms);
                    session.status.message = Some(err.to_string());
                    warn!(session = %id, error = %err, "session failed to become ready");
                }
            }

            if registry.update(session.clone()).is_ok() {
                broker.publish(Event::SessionUpdated { session });
            }
        });
    }

    /// Fetch a session, opportunistically refreshing its status from the
    /// Runtime Adapter if it is currently `Running`.
    pub async fn get(&self, id: SessionId, owner: &OwnerId) -> Result<Session, LifecycleError> {
        let mut session = self.registry.get(id, owner)?;
        let now_ms = self.clock.epoch_ms();

        if session.state == SessionState::Running {
            if let Ok(status) = self.runtime.get_status(id).await {
                let status = into_session_status(status);
                if status != session.status {
                    session.status = status;
                    session.mark_updated(now_ms);
                    let _ = self.registry.update(session.clone());
                    self.broker.publish(Event::SessionUpdated { session: session.clone() });
                }
            }
        }

        session.touch(now_ms);
        self.registry.touch(id, now_ms);
        Ok(session)
    }

    pub fn list(&self, owner: &OwnerId, page_size: usize, page_token: Option<&str>) -> Page {
        self.registry.list(owner, page_size, page_token)
    }

    /// Move a session to `Stopping`, ask the Runtime Adapter to tear down
    /// its backing unit, then remove the record. With `force`, the record
    /// is removed even if the owner doesn't match or teardown fails
    /// (used by the TTL Reaper, which acts without caller context).
    pub async fn delete(&self, id: SessionId, owner: &OwnerId, force: bool) -> Result<(), LifecycleError> {
        let now_ms = self.clock.epoch_ms();
        let mut session = if force { self.registry.get_unchecked(id)? } else { self.registry.get(id, owner)? };

        if session.state.can_transition_to(SessionState::Stopping) {
            session.transition(SessionState::Stopping, now_ms);
            let _ = self.registry.update(session.clone());
            self.broker.publish(Event::SessionUpdated { session: session.clone() });
        }

        let teardown = self.runtime.delete_session(id).await;
        if let Err(err) = &teardown {
            error!(session = %id, error = %err, "runtime delete_session failed");
            if !force {
                return Err(LifecycleError::Internal(id, err.to_string()));
            }
        }

        self.registry.delete(id, owner, force)?;
        self.broker.publish(Event::SessionDeleted { id });
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
