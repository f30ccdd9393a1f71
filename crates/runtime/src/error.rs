// SPDX-License-Identifier: MIT

use thiserror::Error;
use wharf_core::{AsErrorKind, ErrorKind, SessionId};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session {0} has no backing unit")]
    NotFound(SessionId),

    #[error("timed out waiting for session {0} to become ready")]
    Timeout(SessionId),

    #[error("runtime unavailable: {0}")]
    Unavailable(String),

    #[error("runtime error: {0}")]
    Internal(String),
}

impl AsErrorKind for RuntimeError {
    fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::NotFound(_) => ErrorKind::NotFound,
            RuntimeError::Timeout(_) => ErrorKind::Timeout,
            RuntimeError::Unavailable(_) => ErrorKind::Unavailable,
            RuntimeError::Internal(_) => ErrorKind::Internal,
        }
    }
}
