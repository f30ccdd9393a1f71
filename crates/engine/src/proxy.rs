// SPDX-License-Identifier: MIT

//! The Reverse Proxy / Dispatcher (C6): inbound request → session endpoint
//! forwarding, including a bidirectional streaming variant.

use crate::pool::ConnectionPool;
use crate::session_client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wharf_core::{AsErrorKind, ErrorKind, OwnerId, SessionId, SessionState};
use wharf_storage::SessionRegistry;

/// Unary per-call timeout default, per the Reverse Proxy contract.
pub const DEFAULT_UNARY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("session {0} is not running")]
    FailedPrecondition(SessionId),
    #[error("session {0} backend unavailable: {1}")]
    Unavailable(SessionId, String),
}

impl AsErrorKind for ProxyError {
    fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::NotFound(_) => ErrorKind::NotFound,
            ProxyError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            ProxyError::Unavailable(_, _) => ErrorKind::Unavailable,
        }
    }
}

pub struct ProxyRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

pub struct Proxy {
    registry: Arc<SessionRegistry>,
    pool: Arc<ConnectionPool>,
    unary_timeout: Duration,
}

impl Proxy {
    pub fn new(registry: Arc<SessionRegistry>, pool: Arc<ConnectionPool>, unary_timeout: Duration) -> Self {
        Self { registry, pool, unary_timeout }
    }

    /// Unary forward. Rejects sessions the owner does not control, sessions
    /// that are not `Running`, and surfaces backend transport failures as
    /// `Unavailable`; any backend-returned status is passed through
    /// verbatim.
    pub async fn proxy(
        &self,
        session_id: SessionId,
        owner: &OwnerId,
        request: ProxyRequest,
        now_ms: u64,
    ) -> Result<ProxyResponse, ProxyError> {
        let session = self.registry.get(session_id, owner).map_err(|_| ProxyError::NotFound(session_id))?;
        if session.state != SessionState::Running {
            return Err(ProxyError::FailedPrecondition(session_id));
        }
        self.registry.touch(session_id, now_ms);

        let endpoint = self
            .pool
            .get_client(session_id, now_ms)
            .await
            .map_err(|e| ProxyError::Unavailable(session_id, e.to_string()))?;

        let response = session_client::request(
            &endpoint,
            &request.method,
            &request.path,
            &request.headers,
            request.body.as_deref(),
            self.unary_timeout,
        )
        .await
        .map_err(|e| ProxyError::Unavailable(session_id, e.to_string()))?;

        Ok(ProxyResponse { status: response.status, headers: response.headers, body: response.body })
    }

    /// Bidirectional streaming forward: frames from `inbound` are written to
    /// the session's socket, bytes read from the session are sent to
    /// `outbound`, until either side closes or `cancellation` fires.
    pub async fn proxy_stream(
        &self,
        session_id: SessionId,
        owner: &OwnerId,
        mut inbound: mpsc::Receiver<Vec<u8>>,
        outbound: mpsc::Sender<Vec<u8>>,
        cancellation: CancellationToken,
        now_ms: u64,
    ) -> Result<(), ProxyError> {
        let session = self.registry.get(session_id, owner).map_err(|_| ProxyError::NotFound(session_id))?;
        if session.state != SessionState::Running {
            return Err(ProxyError::FailedPrecondition(session_id));
        }
        self.registry.touch(session_id, now_ms);

        let endpoint = self
            .pool
            .get_client(session_id, now_ms)
            .await
            .map_err(|e| ProxyError::Unavailable(session_id, e.to_string()))?;

        let mut stream = TcpStream::connect(&endpoint)
            .await
            .map_err(|e| ProxyError::Unavailable(session_id, e.to_string()))?;
        let (mut read_half, mut write_half) = stream.split();

        let mut read_buf = [0u8; 8192];
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => return Ok(()),
                frame = inbound.recv() => {
                    match frame {
                        Some(bytes) => {
                            if write_half.write_all(&bytes).await.is_err() {
                                return Err(ProxyError::Unavailable(session_id, "write to session failed".to_string()));
                            }
                        }
                        None => return Ok(()),
                    }
                }
                read = read_half.read(&mut read_buf) => {
                    match read {
                        Ok(0) => return Ok(()),
                        Ok(n) => {
                            if outbound.send(read_buf[..n].to_vec()).await.is_err() {
                                return Ok(());
                            }
                        }
                        Err(e) => return Err(ProxyError::Unavailable(session_id, e.to_string())),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
