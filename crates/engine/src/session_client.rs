// SPDX-License-Identifier: MIT

//! Minimal HTTP/1.1 client for talking to a session's internal endpoint.
//!
//! Sessions expose an opaque REST surface over plain TCP; we don't pull in
//! a full HTTP client stack to talk to it, just enough framing to send a
//! request and read a Content-Length-delimited response. Shared by the
//! Connection Pool's health probe and the Reverse Proxy's forwarding path.

use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum SessionClientError {
    #[error("connect to {0} failed: {1}")]
    Connect(String, String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Io(String),
}

pub struct SessionResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl SessionResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Send a single request and read the full response. The whole operation
/// (connect + write + read) is bounded by `timeout`.
pub async fn request(
    endpoint: &str,
    method: &str,
    path: &str,
    headers: &[(String, String)],
    body: Option<&[u8]>,
    timeout: Duration,
) -> Result<SessionResponse, SessionClientError> {
    tokio::time::timeout(timeout, send(endpoint, method, path, headers, body))
        .await
        .map_err(|_| SessionClientError::Timeout(timeout))?
}

async fn send(
    endpoint: &str,
    method: &str,
    path: &str,
    headers: &[(String, String)],
    body: Option<&[u8]>,
) -> Result<SessionResponse, SessionClientError> {
    let mut stream = TcpStream::connect(endpoint)
        .await
        .map_err(|e| SessionClientError::Connect(endpoint.to_string(), e.to_string()))?;

    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n");
    for (name, value) in headers {
        if is_hop_by_hop(name) {
            continue;
        }
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    if let Some(body) = body {
        request.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    request.push_str("\r\n");

    stream.write_all(request.as_bytes()).await.map_err(|e| SessionClientError::Io(e.to_string()))?;
    if let Some(body) = body {
        stream.write_all(body).await.map_err(|e| SessionClientError::Io(e.to_string()))?;
    }

    let mut reader = BufReader::new(&mut stream);
    read_response(&mut reader).await
}

/// Headers that must not be forwarded verbatim between hops (RFC 7230 §6.1).
fn is_hop_by_hop(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection" | "keep-alive" | "proxy-authenticate" | "proxy-authorization" | "te" | "trailers" | "transfer-encoding" | "upgrade"
    )
}

async fn read_response<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<SessionResponse, SessionClientError> {
    let mut status_line = String::new();
    reader.read_line(&mut status_line).await.map_err(|e| SessionClientError::Io(e.to_string()))?;
    let status = status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);

    let mut headers = Vec::new();
    let mut content_length: usize = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.map_err(|e| SessionClientError::Io(e.to_string()))?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.trim_end().split_once(':') {
            let name = name.trim().to_string();
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            }
            headers.push((name, value));
        }
    }

    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body).await.map_err(|e| SessionClientError::Io(e.to_string()))?;
    }

    Ok(SessionResponse { status, headers, body })
}

#[cfg(test)]
#[path = "session_client_tests.rs"]
mod tests;
