use super::*;

#[test]
fn downgrade_marks_completed_with_execution_error() {
    let mut result = WorkerResult {
        worker_id: WorkerId::new(),
        task_id: TaskId::new(),
        status: WorkerStatus::Completed,
        output: Some("hi".to_string()),
        error: None,
    };
    result.downgrade_for_execution_error("exit code 1");
    assert_eq!(result.status, WorkerStatus::CompletedWithExecutionError);
    assert_eq!(result.error.as_deref(), Some("exit code 1"));
}

#[test]
fn downgrade_appends_to_existing_error() {
    let mut result = WorkerResult {
        worker_id: WorkerId::new(),
        task_id: TaskId::new(),
        status: WorkerStatus::Completed,
        output: None,
        error: Some("partial output".to_string()),
    };
    result.downgrade_for_execution_error("exit code 2");
    assert_eq!(result.error.as_deref(), Some("partial output; exit code 2"));
}

#[test]
fn downgrade_does_not_touch_non_completed_status() {
    let mut result = WorkerResult {
        worker_id: WorkerId::new(),
        task_id: TaskId::new(),
        status: WorkerStatus::Cancelled,
        output: None,
        error: None,
    };
    result.downgrade_for_execution_error("exit code 1");
    assert_eq!(result.status, WorkerStatus::Cancelled);
}

#[test]
fn status_display_matches_wire_format() {
    assert_eq!(WorkerStatus::CompletedWithoutApiReport.to_string(), "completed_without_api_report");
    assert_eq!(WorkerStatus::FailedExecution.to_string(), "failed_execution");
}
