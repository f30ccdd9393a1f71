// SPDX-License-Identifier: MIT

//! Kubernetes-backed [`RuntimeAdapter`] — runs each session as a pod with an
//! attached PersistentVolumeClaim workspace.

mod pod;

use crate::error::RuntimeError;
use crate::status::RuntimeStatus;
use crate::RuntimeAdapter;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;
use std::time::Duration;
use wharf_core::{OwnerId, SessionConfig, SessionId};

/// How often `wait_for_ready` re-polls pod status.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct KubernetesRuntime {
    client: Client,
    namespace: String,
}

impl KubernetesRuntime {
    pub async fn new(namespace: impl Into<String>) -> Result<Self, RuntimeError> {
        let client = Client::try_default()
            .await
            .map_err(|e| RuntimeError::Unavailable(format!("failed to create kube client: {e}")))?;
        Ok(Self { client, namespace: namespace.into() })
    }

    pub fn with_client(client: Client, namespace: impl Into<String>) -> Self {
        Self { client, namespace: namespace.into() }
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pvcs(&self) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn pod_ready(pod: &Pod) -> bool {
        pod.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .map(|conds| conds.iter().any(|c| c.type_ == "Ready" && c.status == "True"))
            .unwrap_or(false)
    }

    fn pod_endpoint(pod: &Pod) -> Option<String> {
        let ip = pod.status.as_ref()?.pod_ip.as_ref()?;
        Some(format!("{ip}:{}", pod::REST_PORT))
    }
}

#[async_trait]
impl RuntimeAdapter for KubernetesRuntime {
    async fn create_session(
        &self,
        id: SessionId,
        owner: &OwnerId,
        config: &SessionConfig,
    ) -> Result<(), RuntimeError> {
        let pvc = pod::build_pvc(id, owner, &self.namespace, config);
        self.pvcs()
            .create(&PostParams::default(), &pvc)
            .await
            .map_err(|e| RuntimeError::Internal(format!("pvc creation failed: {e}")))?;

        let pod_spec = pod::build_pod(id, owner, &self.namespace, config);
        if let Err(e) = self.pods().create(&PostParams::default(), &pod_spec).await {
            // Roll back the volume so a retried create doesn't leak it.
            let _ = self.pvcs().delete(&pod::pvc_name(id), &DeleteParams::default()).await;
            return Err(RuntimeError::Internal(format!("pod creation failed: {e}")));
        }
        Ok(())
    }

    async fn wait_for_ready(&self, id: SessionId, timeout: Duration) -> Result<(), RuntimeError> {
        let pods = self.pods();
        let name = pod::pod_name(id);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match pods.get(&name).await {
                Ok(pod) if Self::pod_ready(&pod) => return Ok(()),
                Ok(_) => {}
                Err(kube::Error::Api(e)) if e.code == 404 => {
                    return Err(RuntimeError::NotFound(id));
                }
                Err(e) => {
                    tracing::debug!(session_id = %id, error = %e, "transient error polling pod readiness");
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(RuntimeError::Timeout(id));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn get_status(&self, id: SessionId) -> Result<RuntimeStatus, RuntimeError> {
        let name = pod::pod_name(id);
        let pod = self
            .pods()
            .get(&name)
            .await
            .map_err(|_| RuntimeError::NotFound(id))?;

        let ready = Self::pod_ready(&pod);
        let message = pod
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conds| conds.iter().find(|c| c.type_ == "Ready"))
            .and_then(|c| c.message.clone());

        Ok(RuntimeStatus {
            unit_name: Some(name),
            volume_name: Some(pod::pvc_name(id)),
            internal_endpoint: Self::pod_endpoint(&pod),
            ready,
            ready_at: None,
            message,
        })
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), RuntimeError> {
        let dp = DeleteParams::default();
        match self.pods().delete(&pod::pod_name(id), &dp).await {
            Ok(_) => {}
            Err(kube::Error::Api(e)) if e.code == 404 => {}
            Err(e) => return Err(RuntimeError::Internal(format!("pod deletion failed: {e}"))),
        }
        match self.pvcs().delete(&pod::pvc_name(id), &dp).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(RuntimeError::Internal(format!("pvc deletion failed: {e}"))),
        }
    }

    async fn get_endpoint(&self, id: SessionId) -> Result<String, RuntimeError> {
        let pod = self.pods().get(&pod::pod_name(id)).await.map_err(|_| RuntimeError::NotFound(id))?;
        Self::pod_endpoint(&pod).ok_or(RuntimeError::NotFound(id))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, RuntimeError> {
        let lp = ListParams::default().labels(&pod::list_selector());
        let list = self
            .pods()
            .list(&lp)
            .await
            .map_err(|e| RuntimeError::Unavailable(format!("pod list failed: {e}")))?;
        Ok(list
            .into_iter()
            .filter_map(|pod| pod.metadata.name)
            .filter_map(|name| name.strip_prefix("wharf-").map(SessionId::from_string))
            .collect())
    }

    async fn health_check(&self) -> Result<(), RuntimeError> {
        self.pods()
            .list(&ListParams::default().limit(1))
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::Unavailable(format!("kube api unreachable: {e}")))
    }

    async fn close(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}
