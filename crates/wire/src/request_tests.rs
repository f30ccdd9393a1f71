use super::*;
use wharf_core::{OwnerId, SessionConfig, SessionId};

#[test]
fn ping_serializes_with_tag() {
    let json = serde_json::to_value(Request::Ping).unwrap();
    assert_eq!(json["type"], "Ping");
}

#[test]
fn create_session_roundtrips() {
    let request = Request::CreateSession { owner: OwnerId::new("alice"), config: SessionConfig::default() };
    let json = serde_json::to_string(&request).unwrap();
    let decoded: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, request);
}

#[test]
fn delete_session_defaults_force_to_false() {
    let id = SessionId::new();
    let json = serde_json::json!({"type": "DeleteSession", "id": id.as_str(), "owner": "alice"});
    let decoded: Request = serde_json::from_value(json).unwrap();
    match decoded {
        Request::DeleteSession { force, .. } => assert!(!force),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn list_sessions_omits_page_token_when_absent() {
    let request = Request::ListSessions { owner: OwnerId::new("alice"), page_size: 10, page_token: None };
    let json = serde_json::to_value(&request).unwrap();
    assert!(json.get("page_token").is_none());
}
