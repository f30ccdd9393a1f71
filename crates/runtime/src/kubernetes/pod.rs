// SPDX-License-Identifier: MIT

//! Pod and PersistentVolumeClaim construction for session backing units.

use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, HTTPGetAction, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, Pod, PodSpec, Probe, ResourceRequirements, Volume, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use wharf_core::{OwnerId, SessionConfig, SessionId};

/// Container port the session's streaming-RPC surface listens on.
pub const STREAM_PORT: i32 = 7000;
/// Container port the session's REST surface (including `/health`) listens on.
pub const REST_PORT: i32 = 8000;

const LABEL_APP: &str = "app";
const LABEL_APP_VALUE: &str = "wharf-session";
const LABEL_SESSION_ID: &str = "wharf.dev/session-id";
const LABEL_OWNER_ID: &str = "wharf.dev/owner-id";

pub fn pod_name(id: SessionId) -> String {
    format!("wharf-{}", id)
}

pub fn pvc_name(id: SessionId) -> String {
    format!("wharf-{}-ws", id)
}

fn labels(id: SessionId, owner: &OwnerId) -> BTreeMap<String, String> {
    [
        (LABEL_APP.to_string(), LABEL_APP_VALUE.to_string()),
        (LABEL_SESSION_ID.to_string(), id.as_str().to_string()),
        (LABEL_OWNER_ID.to_string(), owner.as_str().to_string()),
    ]
    .into_iter()
    .collect()
}

/// Label selector used to enumerate orchestrator-owned backing units.
pub fn list_selector() -> String {
    format!("{}={}", LABEL_APP, LABEL_APP_VALUE)
}

pub fn build_pvc(id: SessionId, owner: &OwnerId, namespace: &str, config: &SessionConfig) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(pvc_name(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(labels(id, owner)),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(
                    [("storage".to_string(), Quantity(config.storage_size.clone()))].into_iter().collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn build_pod(id: SessionId, owner: &OwnerId, namespace: &str, config: &SessionConfig) -> Pod {
    let env = config
        .env
        .iter()
        .map(|(k, v)| EnvVar { name: k.clone(), value: Some(v.clone()), ..Default::default() })
        .collect();

    let resources = ResourceRequirements {
        requests: Some(
            [
                ("cpu".to_string(), Quantity(config.cpu_request.clone())),
                ("memory".to_string(), Quantity(config.memory_request.clone())),
            ]
            .into_iter()
            .collect(),
        ),
        limits: Some(
            [
                ("cpu".to_string(), Quantity(config.cpu_limit.clone())),
                ("memory".to_string(), Quantity(config.memory_limit.clone())),
            ]
            .into_iter()
            .collect(),
        ),
        ..Default::default()
    };

    let health_probe = || Probe {
        http_get: Some(HTTPGetAction {
            path: Some("/health".to_string()),
            port: IntOrString::Int(REST_PORT),
            ..Default::default()
        }),
        period_seconds: Some(5),
        ..Default::default()
    };

    let container = Container {
        name: "agent".to_string(),
        image: Some(config.image.clone()),
        working_dir: Some("/workspace".to_string()),
        ports: Some(vec![
            ContainerPort { name: Some("stream".to_string()), container_port: STREAM_PORT, ..Default::default() },
            ContainerPort { name: Some("rest".to_string()), container_port: REST_PORT, ..Default::default() },
        ]),
        volume_mounts: Some(vec![VolumeMount {
            name: "workspace".to_string(),
            mount_path: "/workspace".to_string(),
            ..Default::default()
        }]),
        env: Some(env),
        resources: Some(resources),
        startup_probe: Some(Probe { failure_threshold: Some(60), period_seconds: Some(5), ..health_probe() }),
        readiness_probe: Some(health_probe()),
        liveness_probe: Some(Probe { period_seconds: Some(30), ..health_probe() }),
        ..Default::default()
    };

    Pod {
        metadata: ObjectMeta {
            name: Some(pod_name(id)),
            namespace: Some(namespace.to_string()),
            labels: Some(labels(id, owner)),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container],
            volumes: Some(vec![Volume {
                name: "workspace".to_string(),
                persistent_volume_claim: Some(
                    k8s_openapi::api::core::v1::PersistentVolumeClaimVolumeSource {
                        claim_name: pvc_name(id),
                        ..Default::default()
                    },
                ),
                ..Default::default()
            }]),
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
