// SPDX-License-Identifier: MIT

//! The control socket: a TCP listener speaking the `wharf-wire` framed JSON
//! protocol, dispatching to the Session Lifecycle Manager and Reverse Proxy.
//!
//! Unlike a local-CLI daemon that listens on a Unix socket for trusted
//! same-host clients and TCP for remote ones, this control plane has no
//! local-client counterpart — every caller is a remote control-plane client,
//! so the listener is TCP-only.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use wharf_core::{AsErrorKind, Clock, SystemClock};
use wharf_engine::{LifecycleManager, Proxy, ProxyRequest, WorkerSpawner};
use wharf_storage::SessionRegistry;
use wharf_wire::{read_request, write_response, ProtocolError, Request, Response};

/// Shared daemon context handed to every connection handler.
pub struct ListenCtx {
    pub registry: Arc<SessionRegistry>,
    pub lifecycle: Arc<LifecycleManager<SystemClock>>,
    pub proxy: Arc<Proxy>,
    pub worker_spawner: Arc<WorkerSpawner>,
    pub clock: SystemClock,
    pub ipc_timeout: Duration,
    pub adapter_name: String,
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// TCP listener for the control socket.
pub struct Listener {
    tcp: TcpListener,
    ctx: Arc<ListenCtx>,
    shutdown: CancellationToken,
}

impl Listener {
    pub fn new(tcp: TcpListener, ctx: Arc<ListenCtx>, shutdown: CancellationToken) -> Self {
        Self { tcp, ctx, shutdown }
    }

    /// Accept connections until `shutdown` is cancelled, spawning a task per
    /// connection so one slow client never blocks another.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("control socket listener shutting down");
                    return;
                }
                result = self.tcp.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            debug!(peer = %addr, "accepted control socket connection");
                            let ctx = Arc::clone(&self.ctx);
                            // A child token: the daemon shutting down cancels every open
                            // stream, but one stream disconnecting must not cancel the rest.
                            let cancellation = self.shutdown.child_token();
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, &ctx, cancellation).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("control socket accept error: {e}"),
                    }
                }
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match &e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("client disconnected"),
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("connection timed out"),
        _ => error!("connection error: {e}"),
    }
}

async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
    cancellation: CancellationToken,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let request = read_request(&mut reader, ctx.ipc_timeout).await?;

    if let Request::ProxyStreamOpen { id, owner } = request {
        return handle_stream_session(reader, writer, id, owner, ctx, cancellation).await;
    }

    let response = handle_request(request, ctx).await;
    write_response(&mut writer, &response).await?;
    Ok(())
}

async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Health => Response::Health {
            serving: true,
            active_sessions: ctx.registry.total_count(),
            adapter: ctx.adapter_name.clone(),
        },

        Request::CreateSession { owner, config } => match ctx.lifecycle.create(owner, config).await {
            Ok(session) => Response::Session { session },
            Err(err) => error_response(&err),
        },

        Request::GetSession { id, owner } => match ctx.lifecycle.get(id, &owner).await {
            Ok(session) => Response::Session { session },
            Err(err) => error_response(&err),
        },

        Request::ListSessions { owner, page_size, page_token } => {
            let page = ctx.lifecycle.list(&owner, page_size, page_token.as_deref());
            Response::Sessions { sessions: page.sessions, next_page_token: page.next_page_token }
        }

        Request::DeleteSession { id, owner, force } => match ctx.lifecycle.delete(id, &owner, force).await {
            Ok(()) => Response::Deleted,
            Err(err) => error_response(&err),
        },

        Request::ProxyHttp { id, owner, method, path, headers, body } => {
            let now_ms = ctx.clock.epoch_ms();
            let proxy_request = ProxyRequest { method, path, headers, body };
            match ctx.proxy.proxy(id, &owner, proxy_request, now_ms).await {
                Ok(response) => Response::ProxyHttp { status: response.status, headers: response.headers, body: response.body },
                Err(err) => error_response(&err),
            }
        }

        Request::ProxyStreamOpen { .. } => unreachable!("intercepted in handle_connection"),

        Request::ProxyStreamFrame { .. } | Request::ProxyStreamClose => {
            Response::Error { kind: "InvalidArgument".to_string(), message: "stream frame received outside an open proxy stream".to_string() }
        }
    }
}

fn error_response<E: AsErrorKind + std::fmt::Display>(err: &E) -> Response {
    Response::Error { kind: format!("{:?}", err.kind()), message: err.to_string() }
}

/// Forward a bidirectional proxy stream: wire frames in, raw bytes to the
/// session's backend; bytes back from the backend, wire frames out.
async fn handle_stream_session<R, W>(
    mut reader: R,
    mut writer: W,
    id: wharf_core::SessionId,
    owner: wharf_core::OwnerId,
    ctx: &ListenCtx,
    cancellation: CancellationToken,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let (inbound_tx, inbound_rx) = mpsc::channel::<Vec<u8>>(64);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(64);
    let proxy = Arc::clone(&ctx.proxy);
    let proxy_cancel = cancellation.child_token();
    let now_ms = ctx.clock.epoch_ms();
    let proxy_task = tokio::spawn(async move {
        proxy.proxy_stream(id, &owner, inbound_rx, outbound_tx, proxy_cancel, now_ms).await
    });

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => break,
            frame = read_request(&mut reader, ctx.ipc_timeout) => {
                match frame {
                    Ok(Request::ProxyStreamFrame { data }) => {
                        if inbound_tx.send(data).await.is_err() {
                            break;
                        }
                    }
                    Ok(Request::ProxyStreamClose) => break,
                    Ok(_) => break,
                    Err(ProtocolError::ConnectionClosed) => break,
                    Err(ProtocolError::Timeout) => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            frame = outbound_rx.recv() => {
                match frame {
                    Some(data) => write_response(&mut writer, &Response::ProxyStreamFrame { data }).await?,
                    None => break,
                }
            }
        }
    }

    drop(inbound_tx);
    cancellation.cancel();
    let _ = proxy_task.await;
    let _ = write_response(&mut writer, &Response::ProxyStreamClosed).await;
    Ok(())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
