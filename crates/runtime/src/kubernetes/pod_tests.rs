use super::*;
use wharf_core::SessionConfig;

fn config() -> SessionConfig {
    SessionConfig {
        image: "wharf/agent:1".to_string(),
        ..SessionConfig::default()
    }
}

#[test]
fn pod_name_is_stable_for_an_id() {
    let id = SessionId::new();
    assert_eq!(pod_name(id), pod_name(id));
    assert!(pod_name(id).starts_with("wharf-"));
}

#[test]
fn pvc_name_differs_from_pod_name() {
    let id = SessionId::new();
    assert_ne!(pod_name(id), pvc_name(id));
}

#[test]
fn build_pod_carries_session_and_owner_labels() {
    let id = SessionId::new();
    let owner = OwnerId::new("u1");
    let pod = build_pod(id, &owner, "default", &config());
    let labels = pod.metadata.labels.unwrap();
    assert_eq!(labels.get(LABEL_SESSION_ID).map(String::as_str), Some(id.as_str()));
    assert_eq!(labels.get(LABEL_OWNER_ID).map(String::as_str), Some("u1"));
    assert_eq!(labels.get(LABEL_APP).map(String::as_str), Some(LABEL_APP_VALUE));
}

#[test]
fn build_pod_exposes_stream_and_rest_ports() {
    let pod = build_pod(SessionId::new(), &OwnerId::new("u1"), "default", &config());
    let container = &pod.spec.unwrap().containers[0];
    let ports = container.ports.as_ref().unwrap();
    assert!(ports.iter().any(|p| p.container_port == STREAM_PORT));
    assert!(ports.iter().any(|p| p.container_port == REST_PORT));
}

#[test]
fn build_pod_readiness_probe_targets_health_path() {
    let pod = build_pod(SessionId::new(), &OwnerId::new("u1"), "default", &config());
    let container = &pod.spec.unwrap().containers[0];
    let probe = container.readiness_probe.as_ref().unwrap();
    assert_eq!(probe.http_get.as_ref().unwrap().path.as_deref(), Some("/health"));
}

#[yare::parameterized(
    small = { "1Gi" },
    default_size = { "10Gi" },
    large = { "500Gi" },
)]
fn build_pvc_requests_configured_storage_size(storage_size: &str) {
    let id = SessionId::new();
    let owner = OwnerId::new("u1");
    let mut config = config();
    config.storage_size = storage_size.to_string();
    let pvc = build_pvc(id, &owner, "default", &config);
    let requests = pvc.spec.unwrap().resources.unwrap().requests.unwrap();
    assert_eq!(requests.get("storage").unwrap().0, storage_size);
}

#[test]
fn list_selector_matches_app_label() {
    assert_eq!(list_selector(), format!("{}={}", LABEL_APP, LABEL_APP_VALUE));
}
