use super::*;
use crate::owner::OwnerId;
use crate::session::SessionConfig;
use crate::worker::{TaskId, WorkerId, WorkerStatus};

#[test]
fn session_created_exposes_session_id() {
    let session = Session::new(OwnerId::new("u1"), SessionConfig::default(), 1_000);
    let id = session.id;
    let event = Event::SessionCreated { session };
    assert_eq!(event.session_id(), Some(&id));
}

#[test]
fn session_deleted_exposes_session_id() {
    let session = Session::new(OwnerId::new("u1"), SessionConfig::default(), 1_000);
    let id = session.id;
    let event = Event::SessionDeleted { id };
    assert_eq!(event.session_id(), Some(&id));
}

#[test]
fn worker_completion_has_no_session_id() {
    let event = Event::WorkerCompletion {
        result: WorkerResult {
            worker_id: WorkerId::new(),
            task_id: TaskId::new(),
            status: WorkerStatus::Completed,
            output: None,
            error: None,
        },
    };
    assert_eq!(event.session_id(), None);
}

#[test]
fn session_created_serializes_with_tag() {
    let session = Session::new(OwnerId::new("u1"), SessionConfig::default(), 1_000);
    let event = Event::SessionCreated { session };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "created");
}
