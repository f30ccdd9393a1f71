// SPDX-License-Identifier: MIT

//! The Worker Spawner + Result Collector (C7): forks short-lived sibling
//! worker processes on behalf of a primary agent, serves their callback
//! API, and reconciles a worker's actual exit status with whatever result
//! it self-reported.

use crate::broker::Broker;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tracing::error;
use wharf_core::{AsErrorKind, ErrorKind, Event, TaskId, WorkerId, WorkerRecord, WorkerResult, WorkerStatus};

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to write task scratch file: {0}")]
    ScratchFile(String),
    #[error("failed to spawn worker process: {0}")]
    Spawn(String),
    #[error("malformed worker report: {0}")]
    InvalidReport(String),
    #[error("unknown worker {0}")]
    UnknownWorker(String),
    #[error("callback token does not match the one issued to this worker")]
    BadCallbackToken,
}

impl AsErrorKind for SpawnError {
    fn kind(&self) -> ErrorKind {
        match self {
            SpawnError::InvalidReport(_) => ErrorKind::InvalidArgument,
            SpawnError::ScratchFile(_) | SpawnError::Spawn(_) => ErrorKind::Internal,
            SpawnError::UnknownWorker(_) => ErrorKind::NotFound,
            SpawnError::BadCallbackToken => ErrorKind::PermissionDenied,
        }
    }
}

/// What a primary agent asks the spawner to run.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    pub task_id: TaskId,
    pub prompt: String,
    pub cwd: PathBuf,
    /// Path to the worker-mode-capable executable to fork.
    pub command: PathBuf,
}

#[derive(Serialize)]
struct ScratchTask<'a> {
    task_id: &'a str,
    prompt: &'a str,
    callback_token: &'a str,
}

/// Payload POSTed by a worker to `/report_result`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResultPayload {
    pub agent_id: String,
    pub task_id: String,
    pub status: String,
    pub callback_token: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

struct Inner {
    workers: HashMap<WorkerId, WorkerRecord>,
    results: HashMap<WorkerId, WorkerResult>,
}

/// Map of active workers and map of worker results, behind one mutex held
/// only for map operations, never across I/O.
pub struct WorkerSpawner {
    orchestrator_api: String,
    inner: Arc<Mutex<Inner>>,
    broker: Broker<Event>,
}

impl WorkerSpawner {
    pub fn new(orchestrator_api: String, broker: Broker<Event>) -> Self {
        Self {
            orchestrator_api,
            inner: Arc::new(Mutex::new(Inner { workers: HashMap::new(), results: HashMap::new() })),
            broker,
        }
    }

    /// Generate a `worker_id`, write the task description to a scratch
    /// file, and fork a worker-mode child process pointed at it. The
    /// scratch file is kept alive until the child exits (and is then
    /// dropped, deleting it) so a slow-starting worker can still read it.
    pub async fn spawn(&self, task: TaskDefinition, now_ms: u64) -> Result<WorkerId, SpawnError> {
        let worker_id = WorkerId::new();
        let callback_token = nanoid::nanoid!(24);

        let scratch = NamedTempFile::new().map_err(|e| SpawnError::ScratchFile(e.to_string()))?;
        let payload = ScratchTask { task_id: task.task_id.as_str(), prompt: &task.prompt, callback_token: &callback_token };
        serde_json::to_writer(scratch.as_file(), &payload).map_err(|e| SpawnError::ScratchFile(e.to_string()))?;
        let scratch_path = scratch.path().to_path_buf();

        let mut command = Command::new(&task.command);
        command
            .arg("--worker-mode")
            .arg("--agent-id")
            .arg(worker_id.as_str())
            .arg("--task-id")
            .arg(task.task_id.as_str())
            .arg("--task-file")
            .arg(&scratch_path)
            .arg("--orchestrator-api")
            .arg(&self.orchestrator_api)
            .arg("--cwd")
            .arg(&task.cwd)
            .current_dir(&task.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command.spawn().map_err(|e| SpawnError::Spawn(e.to_string()))?;

        let record = WorkerRecord {
            worker_id,
            task_id: task.task_id,
            prompt: task.prompt,
            spawned_at_ms: now_ms,
            pid: child.id(),
            callback_token,
        };
        self.inner.lock().workers.insert(worker_id, record.clone());

        self.spawn_reaper(worker_id, record.task_id, child, scratch);
        Ok(worker_id)
    }

    fn spawn_reaper(&self, worker_id: WorkerId, task_id: TaskId, child: tokio::process::Child, scratch: NamedTempFile) {
        let inner = self.inner.clone();
        let broker = self.broker.clone();
        tokio::spawn(async move {
            let _scratch = scratch; // held until this task ends, then deleted

            let output = match child.wait_with_output().await {
                Ok(output) => output,
                Err(e) => {
                    error!(worker = %worker_id, error = %e, "failed to wait on worker process");
                    return;
                }
            };

            let already_reported = inner.lock().results.get(&worker_id).cloned();
            let completed_result = match already_reported {
                Some(mut result) if !output.status.success() => {
                    result.downgrade_for_execution_error(&format!("worker process exited with {}", output.status));
                    Some(result)
                }
                Some(_) => None, // already reported and exited cleanly; nothing to reconcile
                None => {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    let (status, error) = if output.status.success() {
                        (WorkerStatus::CompletedWithoutApiReport, None)
                    } else {
                        let message = if stderr.is_empty() {
                            format!("worker process exited with {}", output.status)
                        } else {
                            stderr
                        };
                        (WorkerStatus::FailedExecution, Some(message))
                    };
                    Some(WorkerResult { worker_id, task_id, status, output: None, error })
                }
            };

            if let Some(result) = completed_result {
                inner.lock().results.insert(worker_id, result.clone());
                broker.publish(Event::WorkerCompletion { result });
            }
        });
    }

    /// Decode a worker's self-reported result, overwrite any prior entry,
    /// and publish a `worker_completion` event (dropped, not blocked, if
    /// the event queue is full — the canonical copy is already stored).
    ///
    /// Rejects the report unless `callback_token` matches the token
    /// `spawn` issued for this worker, so a caller that only guesses a
    /// `worker_id` cannot forge another worker's result.
    pub fn report_result(&self, payload: ReportResultPayload) -> Result<(), SpawnError> {
        let status = match payload.status.as_str() {
            "completed" => WorkerStatus::Completed,
            "failed" => WorkerStatus::Failed,
            "cancelled" => WorkerStatus::Cancelled,
            other => return Err(SpawnError::InvalidReport(format!("unknown worker status {other:?}"))),
        };
        let worker_id = WorkerId::from_string(&payload.agent_id);
        {
            let inner = self.inner.lock();
            let record = inner.workers.get(&worker_id).ok_or_else(|| SpawnError::UnknownWorker(payload.agent_id.clone()))?;
            if record.callback_token != payload.callback_token {
                return Err(SpawnError::BadCallbackToken);
            }
        }
        let result = WorkerResult {
            worker_id,
            task_id: TaskId::from_string(&payload.task_id),
            status,
            output: payload.result,
            error: payload.error,
        };
        self.inner.lock().results.insert(worker_id, result.clone());
        self.broker.publish(Event::WorkerCompletion { result });
        Ok(())
    }

    pub fn get_result(&self, worker_id: WorkerId) -> Option<WorkerResult> {
        self.inner.lock().results.get(&worker_id).cloned()
    }

    pub fn get_worker(&self, worker_id: WorkerId) -> Option<WorkerRecord> {
        self.inner.lock().workers.get(&worker_id).cloned()
    }
}

#[cfg(test)]
#[path = "worker_spawner_tests.rs"]
mod tests;
