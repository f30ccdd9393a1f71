// SPDX-License-Identifier: MIT

//! The [`Session`] entity: the control-plane record for one isolated agent
//! workload, and its state machine.

use crate::owner::OwnerId;
use crate::{define_id, id::IdBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

define_id! {
    /// Opaque unique identifier for a [`Session`], assigned at creation.
    pub struct SessionId("sess");
}

/// Lifecycle state of a session. See the transition table in
/// [`SessionState::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Creating,
    Running,
    Stopping,
    Error,
    Unknown,
}

impl SessionState {
    /// Whether `self -> next` is a legal transition per the state machine
    /// in the Session Lifecycle Manager design.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Creating, Running) | (Creating, Error) | (Running, Stopping) | (Running, Error) | (Error, Stopping)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Creating => "creating",
            SessionState::Running => "running",
            SessionState::Stopping => "stopping",
            SessionState::Error => "error",
            SessionState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Creation-time parameters for a session. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub image: String,
    pub cpu_request: String,
    pub memory_request: String,
    pub cpu_limit: String,
    pub memory_limit: String,
    pub storage_size: String,
    /// Ordered, duplicate-tolerant environment variables forwarded to the
    /// backing unit (matches the order Kubernetes `EnvVar` lists use).
    pub env: Vec<(String, String)>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            image: String::new(),
            cpu_request: "100m".to_string(),
            memory_request: "256Mi".to_string(),
            cpu_limit: "500m".to_string(),
            memory_limit: "512Mi".to_string(),
            storage_size: "1Gi".to_string(),
            env: Vec::new(),
        }
    }
}

/// The runtime's last observed view of a session's backing unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Backing-unit identity, e.g. a pod name.
    pub unit_name: Option<String>,
    /// Workspace volume identity, e.g. a PVC name.
    pub volume_name: Option<String>,
    /// In-cluster address of the session's internal endpoint.
    pub internal_endpoint: Option<String>,
    pub ready: bool,
    pub ready_at: Option<u64>,
    /// Last non-empty message observed from any runtime probe.
    pub message: Option<String>,
}

/// The central control-plane entity: one isolated agent workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub owner_id: OwnerId,
    pub name: Option<String>,
    pub state: SessionState,
    pub config: SessionConfig,
    pub status: SessionStatus,
    pub labels: BTreeMap<String, String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub last_accessed_at_ms: u64,
    /// Incremented on every `update()`; used by the Connection Pool to
    /// invalidate cached clients when the endpoint changes underneath it.
    pub generation: u64,
}

impl Session {
    pub fn new(owner_id: OwnerId, config: SessionConfig, now_ms: u64) -> Self {
        Self {
            id: SessionId::new(),
            owner_id,
            name: None,
            state: SessionState::Creating,
            config,
            status: SessionStatus::default(),
            labels: BTreeMap::new(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            last_accessed_at_ms: now_ms,
            generation: 0,
        }
    }

    /// Whether this session may be handed to the Connection Pool or Proxy.
    pub fn is_servable(&self) -> bool {
        self.state == SessionState::Running
            && self.status.ready
            && self.status.internal_endpoint.is_some()
    }

    pub fn touch(&mut self, now_ms: u64) {
        self.last_accessed_at_ms = self.last_accessed_at_ms.max(now_ms);
    }

    /// Apply a state transition, bumping `updated_at` and `generation`.
    /// Panics in debug builds if the transition is illegal — callers are
    /// expected to check `SessionState::can_transition_to` or only ever
    /// reach this through the Lifecycle Manager, which does.
    pub fn transition(&mut self, next: SessionState, now_ms: u64) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal session transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
        self.updated_at_ms = now_ms;
        self.generation += 1;
    }

    pub fn mark_updated(&mut self, now_ms: u64) {
        self.updated_at_ms = now_ms;
        self.generation += 1;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
