// SPDX-License-Identifier: MIT

//! Ephemeral worker records: short-lived sibling processes forked by a
//! primary agent to execute sub-tasks.

use crate::define_id;
use serde::{Deserialize, Serialize};

define_id! {
    /// Identifier of a spawned worker process.
    pub struct WorkerId("wkr-");
}

define_id! {
    /// Identifier of the sub-task a worker was spawned to execute.
    pub struct TaskId("task");
}

/// Terminal status of a worker's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Completed,
    Failed,
    Cancelled,
    /// The worker reported a result via the callback API, but the process
    /// also exited non-zero; the wait error is appended to `WorkerResult.error`.
    CompletedWithExecutionError,
    /// The worker process exited zero without ever POSTing a result.
    CompletedWithoutApiReport,
    /// The worker process exited non-zero and never reported a result.
    FailedExecution,
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerStatus::Completed => "completed",
            WorkerStatus::Failed => "failed",
            WorkerStatus::Cancelled => "cancelled",
            WorkerStatus::CompletedWithExecutionError => "completed_with_execution_error",
            WorkerStatus::CompletedWithoutApiReport => "completed_without_api_report",
            WorkerStatus::FailedExecution => "failed_execution",
        };
        f.write_str(s)
    }
}

/// Bookkeeping record for a worker from the moment it is spawned.
#[derive(Debug, Clone)]
pub struct WorkerRecord {
    pub worker_id: WorkerId,
    pub task_id: TaskId,
    pub prompt: String,
    pub spawned_at_ms: u64,
    /// OS process id of the spawned child, once known.
    pub pid: Option<u32>,
    /// Unguessable token the worker must present to `/report_result`.
    pub callback_token: String,
}

/// The outcome of a worker's execution, produced either by the worker's own
/// `POST /report_result` or synthesized from its exit status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerResult {
    pub worker_id: WorkerId,
    pub task_id: TaskId,
    pub status: WorkerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerResult {
    pub fn downgrade_for_execution_error(&mut self, wait_error: &str) {
        if self.status == WorkerStatus::Completed {
            self.status = WorkerStatus::CompletedWithExecutionError;
        }
        let appended = match self.error.take() {
            Some(existing) => format!("{existing}; {wait_error}"),
            None => wait_error.to_string(),
        };
        self.error = Some(appended);
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
