// SPDX-License-Identifier: MIT

//! The Runtime Adapter (C3): an abstract interface over a container
//! platform, with a Kubernetes-backed default implementation.
//!
//! Upstream components (the Lifecycle Manager, the Connection Pool) see
//! only "backing unit" and "endpoint" — never pod names or namespaces.
//! Alternative substrates (a local process sandbox, a micro-VM pool)
//! implement the same [`RuntimeAdapter`] trait without upstream changes.

pub mod error;
pub mod kubernetes;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::RuntimeError;
pub use kubernetes::KubernetesRuntime;
pub use status::RuntimeStatus;

use async_trait::async_trait;
use std::time::Duration;
use wharf_core::{OwnerId, SessionConfig, SessionId};

/// Capability set required of any compute substrate backing a session.
#[async_trait]
pub trait RuntimeAdapter: Send + Sync + 'static {
    /// Provision a workspace volume then a compute unit with that volume
    /// mounted, labelled with `id` and `owner`. Returns once creation is
    /// accepted by the platform; readiness is polled separately via
    /// [`wait_for_ready`](Self::wait_for_ready).
    async fn create_session(
        &self,
        id: SessionId,
        owner: &OwnerId,
        config: &SessionConfig,
    ) -> Result<(), RuntimeError>;

    /// Poll the backing unit until its readiness condition is true, or
    /// fail with [`RuntimeError::Timeout`] / [`RuntimeError::Internal`].
    async fn wait_for_ready(&self, id: SessionId, timeout: Duration) -> Result<(), RuntimeError>;

    async fn get_status(&self, id: SessionId) -> Result<RuntimeStatus, RuntimeError>;

    /// Remove the compute unit then the volume. Idempotent: deleting an
    /// already-absent session succeeds.
    async fn delete_session(&self, id: SessionId) -> Result<(), RuntimeError>;

    async fn get_endpoint(&self, id: SessionId) -> Result<String, RuntimeError>;

    /// Enumerate backing units labelled as belonging to this orchestrator.
    async fn list_sessions(&self) -> Result<Vec<SessionId>, RuntimeError>;

    /// Cheap liveness probe of the adapter itself, not of any session.
    async fn health_check(&self) -> Result<(), RuntimeError>;

    /// Release adapter-held resources. Idempotent.
    async fn close(&self) -> Result<(), RuntimeError>;
}
