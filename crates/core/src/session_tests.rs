use super::*;

fn new_session() -> Session {
    Session::new(OwnerId::new("u1"), SessionConfig::default(), 1_000)
}

#[test]
fn new_session_starts_creating_and_not_servable() {
    let session = new_session();
    assert_eq!(session.state, SessionState::Creating);
    assert!(!session.is_servable());
}

#[test]
fn running_with_endpoint_and_ready_is_servable() {
    let mut session = new_session();
    session.transition(SessionState::Running, 2_000);
    session.status.ready = true;
    session.status.internal_endpoint = Some("10.0.0.1:8080".to_string());
    assert!(session.is_servable());
}

#[test]
fn running_without_ready_flag_is_not_servable() {
    let mut session = new_session();
    session.transition(SessionState::Running, 2_000);
    session.status.internal_endpoint = Some("10.0.0.1:8080".to_string());
    assert!(!session.is_servable());
}

#[test]
fn legal_transitions_are_accepted() {
    assert!(SessionState::Creating.can_transition_to(SessionState::Running));
    assert!(SessionState::Creating.can_transition_to(SessionState::Error));
    assert!(SessionState::Running.can_transition_to(SessionState::Stopping));
    assert!(SessionState::Running.can_transition_to(SessionState::Error));
    assert!(SessionState::Error.can_transition_to(SessionState::Stopping));
}

#[test]
fn illegal_transitions_are_rejected() {
    assert!(!SessionState::Stopping.can_transition_to(SessionState::Running));
    assert!(!SessionState::Creating.can_transition_to(SessionState::Stopping));
    assert!(!SessionState::Error.can_transition_to(SessionState::Running));
    assert!(!SessionState::Unknown.can_transition_to(SessionState::Running));
}

#[test]
fn transition_bumps_generation_and_updated_at() {
    let mut session = new_session();
    let gen0 = session.generation;
    session.transition(SessionState::Running, 5_000);
    assert_eq!(session.generation, gen0 + 1);
    assert_eq!(session.updated_at_ms, 5_000);
}

#[test]
fn touch_is_monotonically_non_decreasing() {
    let mut session = new_session();
    session.touch(5_000);
    assert_eq!(session.last_accessed_at_ms, 5_000);
    session.touch(1_000);
    assert_eq!(session.last_accessed_at_ms, 5_000, "touch must never move time backwards");
}
