use super::*;
use wharf_core::SessionConfig;

fn session(owner: &str, created_at_ms: u64) -> Session {
    Session::new(OwnerId::new(owner), SessionConfig::default(), created_at_ms)
}

#[test]
fn create_then_get_round_trips() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    let id = session.id;
    registry.create(session).unwrap();
    let fetched = registry.get(id, &OwnerId::new("u1")).unwrap();
    assert_eq!(fetched.id, id);
}

#[test]
fn create_duplicate_id_fails_already_exists() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    registry.create(session.clone()).unwrap();
    let err = registry.create(session).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn get_with_wrong_owner_is_not_found() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    let id = session.id;
    registry.create(session).unwrap();
    let err = registry.get(id, &OwnerId::new("u2")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn get_missing_id_is_not_found() {
    let registry = SessionRegistry::new();
    let err = registry.get(SessionId::new(), &OwnerId::new("u1")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[yare::parameterized(
    owner_mismatch_unforced = { false, false },
    owner_mismatch_forced = { true, true },
)]
fn delete_honors_the_force_flag_against_a_mismatched_owner(force: bool, should_succeed: bool) {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    let id = session.id;
    registry.create(session).unwrap();

    let result = registry.delete(id, &OwnerId::new("u2"), force);
    assert_eq!(result.is_ok(), should_succeed);
}

#[test]
fn list_only_includes_matching_owner() {
    let registry = SessionRegistry::new();
    registry.create(session("u1", 1_000)).unwrap();
    registry.create(session("u2", 2_000)).unwrap();
    let page = registry.list(&OwnerId::new("u1"), 10, None);
    assert_eq!(page.sessions.len(), 1);
    assert_eq!(page.sessions[0].owner_id, OwnerId::new("u1"));
}

#[test]
fn list_orders_by_created_at_descending() {
    let registry = SessionRegistry::new();
    let s1 = session("u1", 1_000);
    let s2 = session("u1", 2_000);
    let s3 = session("u1", 3_000);
    registry.create(s1.clone()).unwrap();
    registry.create(s2.clone()).unwrap();
    registry.create(s3.clone()).unwrap();
    let page = registry.list(&OwnerId::new("u1"), 10, None);
    let ids: Vec<_> = page.sessions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![s3.id, s2.id, s1.id]);
    assert!(page.next_page_token.is_none());
}

#[test]
fn list_paginates_with_opaque_token() {
    let registry = SessionRegistry::new();
    let s1 = session("u1", 1_000);
    let s2 = session("u1", 2_000);
    let s3 = session("u1", 3_000);
    registry.create(s1.clone()).unwrap();
    registry.create(s2.clone()).unwrap();
    registry.create(s3.clone()).unwrap();

    let first = registry.list(&OwnerId::new("u1"), 2, None);
    assert_eq!(first.sessions.len(), 2);
    assert!(first.next_page_token.is_some());

    let second = registry.list(&OwnerId::new("u1"), 2, first.next_page_token.as_deref());
    assert_eq!(second.sessions.len(), 1);
    assert_eq!(second.sessions[0].id, s1.id);
    assert!(second.next_page_token.is_none());
}

#[test]
fn update_missing_session_is_not_found() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    let err = registry.update(session).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn update_writes_new_state() {
    let registry = SessionRegistry::new();
    let mut session = session("u1", 1_000);
    let id = session.id;
    registry.create(session.clone()).unwrap();
    session.transition(wharf_core::SessionState::Running, 2_000);
    registry.update(session).unwrap();
    let fetched = registry.get(id, &OwnerId::new("u1")).unwrap();
    assert_eq!(fetched.state, wharf_core::SessionState::Running);
}

#[test]
fn delete_without_force_requires_matching_owner() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    let id = session.id;
    registry.create(session).unwrap();
    let err = registry.delete(id, &OwnerId::new("u2"), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    registry.get(id, &OwnerId::new("u1")).expect("session should still exist");
}

#[test]
fn delete_with_force_ignores_owner() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    let id = session.id;
    registry.create(session).unwrap();
    registry.delete(id, &OwnerId::new("u2"), true).unwrap();
    assert_eq!(registry.get(id, &OwnerId::new("u1")).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn touch_on_missing_session_is_a_silent_no_op() {
    let registry = SessionRegistry::new();
    registry.touch(SessionId::new(), 5_000);
}

#[test]
fn touch_advances_last_accessed_at() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    let id = session.id;
    registry.create(session).unwrap();
    registry.touch(id, 5_000);
    let fetched = registry.get_unchecked(id).unwrap();
    assert_eq!(fetched.last_accessed_at_ms, 5_000);
}

#[test]
fn count_is_scoped_to_owner() {
    let registry = SessionRegistry::new();
    registry.create(session("u1", 1_000)).unwrap();
    registry.create(session("u1", 2_000)).unwrap();
    registry.create(session("u2", 3_000)).unwrap();
    assert_eq!(registry.count(&OwnerId::new("u1")), 2);
    assert_eq!(registry.count(&OwnerId::new("u2")), 1);
}

#[test]
fn list_expired_finds_sessions_past_ttl() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    let id = session.id;
    registry.create(session).unwrap();
    registry.touch(id, 1_000);

    let now_ms = 1_000 + 3_600_000;
    let expired = registry.list_expired(3600, now_ms);
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, id);
}

#[test]
fn list_expired_excludes_recently_accessed() {
    let registry = SessionRegistry::new();
    let session = session("u1", 1_000);
    registry.create(session).unwrap();
    let expired = registry.list_expired(3600, 1_500);
    assert!(expired.is_empty());
}

#[test]
fn open_durable_replays_prior_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.jsonl");
    let id = {
        let registry = SessionRegistry::open_durable(&path).unwrap();
        let session = session("u1", 1_000);
        let id = session.id;
        registry.create(session).unwrap();
        id
    };

    let registry = SessionRegistry::open_durable(&path).unwrap();
    let fetched = registry.get(id, &OwnerId::new("u1")).unwrap();
    assert_eq!(fetched.id, id);
}
