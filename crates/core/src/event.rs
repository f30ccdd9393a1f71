// SPDX-License-Identifier: MIT

//! Lifecycle events fanned out through the Pub/Sub Broker.
//!
//! Serializes with `{"kind": "...", ...fields}`, mirroring the tagged-enum
//! wire format used throughout this codebase's event types.

use crate::session::{Session, SessionId};
use crate::worker::WorkerResult;
use serde::{Deserialize, Serialize};

/// A typed lifecycle event. Within a single session id, `created` always
/// precedes any `updated`, and `deleted` (if present) is always last.
/// Worker completion events for distinct workers are independent of each
/// other and of session events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Event {
    #[serde(rename = "created")]
    SessionCreated { session: Session },

    #[serde(rename = "updated")]
    SessionUpdated { session: Session },

    #[serde(rename = "deleted")]
    SessionDeleted { id: SessionId },

    #[serde(rename = "worker_completion")]
    WorkerCompletion { result: WorkerResult },
}

impl Event {
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Event::SessionCreated { session } | Event::SessionUpdated { session } => {
                Some(&session.id)
            }
            Event::SessionDeleted { id } => Some(id),
            Event::WorkerCompletion { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
