// SPDX-License-Identifier: MIT

//! Error taxonomy shared across the control plane.
//!
//! [`ErrorKind`] is the gRPC-style classification carried by every public
//! operation; [`CoreError`] is the concrete leaf error type produced by this
//! crate's own logic (state-machine violations, id parsing, config loading).
//! Other crates define their own leaf error types and map them to
//! [`ErrorKind`] via [`AsErrorKind`] rather than wrapping `CoreError`
//! directly.

use thiserror::Error;

/// Classification used to pick an RPC status / HTTP status code at the API
/// boundary. Mirrors the standard gRPC canonical codes this control plane
/// actually uses; it does not attempt to cover the full gRPC code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    FailedPrecondition,
    Unavailable,
    Timeout,
    PermissionDenied,
    Internal,
}

impl ErrorKind {
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::PermissionDenied => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::AlreadyExists => 409,
            ErrorKind::FailedPrecondition => 412,
            ErrorKind::Timeout => 504,
            ErrorKind::Unavailable => 503,
            ErrorKind::Internal => 500,
        }
    }
}

/// Trait implemented by every leaf error type that can cross the API
/// boundary, so the gateway layers can classify errors without matching on
/// concrete types from every crate.
pub trait AsErrorKind {
    fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),

    #[error("illegal state transition {from} -> {to}")]
    IllegalTransition { from: String, to: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("owner id must not be empty")]
    EmptyOwner,
}

impl AsErrorKind for CoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidSessionId(_) => ErrorKind::InvalidArgument,
            CoreError::IllegalTransition { .. } => ErrorKind::FailedPrecondition,
            CoreError::Config(_) => ErrorKind::Internal,
            CoreError::EmptyOwner => ErrorKind::InvalidArgument,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
