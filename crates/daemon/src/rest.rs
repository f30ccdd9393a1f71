// SPDX-License-Identifier: MIT

//! REST gateway: an HTTP/1.1 surface over the same control-plane
//! operations the `wharf-wire` socket exposes, plus the worker
//! self-report callback (`POST /report_result`) that worker processes call
//! back into via `--orchestrator-api`.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use wharf_core::{AsErrorKind, Clock, ErrorKind, OwnerId, SessionConfig, SessionId, SystemClock};
use wharf_engine::{LifecycleError, LifecycleManager, Proxy, ProxyError, ProxyRequest, ReportResultPayload, SpawnError, WorkerSpawner};
use wharf_storage::SessionRegistry;

pub type GatewayBody = Full<Bytes>;

/// Everything a request handler needs; shared across connections via `Arc`.
#[derive(Clone)]
pub struct GatewayCtx {
    pub registry: Arc<SessionRegistry>,
    pub lifecycle: Arc<LifecycleManager<SystemClock>>,
    pub proxy: Arc<Proxy>,
    pub worker_spawner: Arc<WorkerSpawner>,
    pub clock: SystemClock,
    pub adapter_name: String,
}

#[derive(Debug, Error)]
enum GatewayError {
    #[error("missing required query parameter {0:?}")]
    MissingParam(&'static str),
    #[error("malformed request body: {0}")]
    BadBody(String),
    #[error("no route for {0} {1}")]
    NoRoute(Method, String),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Proxy(#[from] ProxyError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

impl AsErrorKind for GatewayError {
    fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::MissingParam(_) | GatewayError::BadBody(_) => ErrorKind::InvalidArgument,
            GatewayError::NoRoute(_, _) => ErrorKind::NotFound,
            GatewayError::Lifecycle(e) => e.kind(),
            GatewayError::Proxy(e) => e.kind(),
            GatewayError::Spawn(e) => e.kind(),
        }
    }
}

/// Entry point wired into the hyper connection builder. Never returns
/// `Err`: every failure is translated into an HTTP error response first.
pub async fn serve(req: Request<Incoming>, ctx: Arc<GatewayCtx>) -> Result<Response<GatewayBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    match route(req, &ctx).await {
        Ok(response) => Ok(response),
        Err(err) => {
            error!(%method, %path, error = %err, "request failed");
            Ok(error_response(&err))
        }
    }
}

async fn route(req: Request<Incoming>, ctx: &GatewayCtx) -> Result<Response<GatewayBody>, GatewayError> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = parse_query(req.uri().query().unwrap_or(""));
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (&method, segments.as_slice()) {
        (&Method::GET, ["health"]) => handle_health(ctx).await,
        (&Method::POST, ["sessions"]) => handle_create_session(req, ctx).await,
        (&Method::GET, ["sessions"]) => handle_list_sessions(&query, ctx).await,
        (&Method::GET, ["sessions", id]) => handle_get_session(id, &query, ctx).await,
        (&Method::DELETE, ["sessions", id]) => handle_delete_session(id, &query, ctx).await,
        (_, ["sessions", id, "proxy", rest @ ..]) => handle_proxy(req, id, &query, rest, ctx).await,
        (&Method::POST, ["report_result"]) => handle_report_result(req, ctx).await,
        _ => Err(GatewayError::NoRoute(method, path)),
    }
}

#[derive(Serialize)]
struct HealthBody {
    serving: bool,
    active_sessions: usize,
    adapter: String,
}

async fn handle_health(ctx: &GatewayCtx) -> Result<Response<GatewayBody>, GatewayError> {
    json_response(
        StatusCode::OK,
        &HealthBody { serving: true, active_sessions: ctx.registry.total_count(), adapter: ctx.adapter_name.clone() },
    )
}

#[derive(Deserialize)]
struct CreateSessionBody {
    owner: String,
    #[serde(default)]
    config: SessionConfig,
}

async fn handle_create_session(req: Request<Incoming>, ctx: &GatewayCtx) -> Result<Response<GatewayBody>, GatewayError> {
    let body: CreateSessionBody = read_json(req).await?;
    let session = ctx.lifecycle.create(OwnerId::new(body.owner), body.config).await?;
    json_response(StatusCode::CREATED, &session)
}

async fn handle_list_sessions(query: &[(String, String)], ctx: &GatewayCtx) -> Result<Response<GatewayBody>, GatewayError> {
    let owner = OwnerId::new(require_param(query, "owner")?);
    let page_size = param(query, "page_size").and_then(|v| v.parse().ok()).unwrap_or(50);
    let page_token = param(query, "page_token");
    let page = ctx.lifecycle.list(&owner, page_size, page_token.as_deref());

    #[derive(Serialize)]
    struct ListBody {
        sessions: Vec<wharf_core::Session>,
        next_page_token: Option<String>,
    }
    json_response(StatusCode::OK, &ListBody { sessions: page.sessions, next_page_token: page.next_page_token })
}

async fn handle_get_session(id: &str, query: &[(String, String)], ctx: &GatewayCtx) -> Result<Response<GatewayBody>, GatewayError> {
    let owner = OwnerId::new(require_param(query, "owner")?);
    let session = ctx.lifecycle.get(SessionId::from_string(id), &owner).await?;
    json_response(StatusCode::OK, &session)
}

async fn handle_delete_session(id: &str, query: &[(String, String)], ctx: &GatewayCtx) -> Result<Response<GatewayBody>, GatewayError> {
    let owner = OwnerId::new(require_param(query, "owner")?);
    let force = param(query, "force").map(|v| v == "true").unwrap_or(false);
    ctx.lifecycle.delete(SessionId::from_string(id), &owner, force).await?;
    Ok(no_content())
}

async fn handle_proxy(
    req: Request<Incoming>,
    id: &str,
    query: &[(String, String)],
    rest: &[&str],
    ctx: &GatewayCtx,
) -> Result<Response<GatewayBody>, GatewayError> {
    let owner = OwnerId::new(require_param(query, "owner")?);
    let method = req.method().to_string();
    let headers = req
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
        .collect();
    let body = req.collect().await.map_err(|e| GatewayError::BadBody(e.to_string()))?.to_bytes();
    let body = if body.is_empty() { None } else { Some(body.to_vec()) };

    let now_ms = ctx.clock.epoch_ms();
    let forwarded_path = format!("/{}", rest.join("/"));
    let request = ProxyRequest { method, path: forwarded_path, headers, body };
    let response = ctx.proxy.proxy(SessionId::from_string(id), &owner, request, now_ms).await?;

    let mut builder = Response::builder().status(response.status);
    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }
    Ok(builder.body(GatewayBody::new(Bytes::from(response.body))).map_err(|e| GatewayError::BadBody(e.to_string()))?)
}

async fn handle_report_result(req: Request<Incoming>, ctx: &GatewayCtx) -> Result<Response<GatewayBody>, GatewayError> {
    let payload: ReportResultPayload = read_json(req).await?;
    ctx.worker_spawner.report_result(payload)?;
    Ok(no_content())
}

/// An empty 204 response body is infallible to construct; `Response::builder`
/// only fails on malformed headers, and none are set here.
#[allow(clippy::expect_used)]
fn no_content() -> Response<GatewayBody> {
    Response::builder().status(StatusCode::NO_CONTENT).body(GatewayBody::new(Bytes::new())).expect("static response is well-formed")
}

async fn read_json<T: serde::de::DeserializeOwned>(req: Request<Incoming>) -> Result<T, GatewayError> {
    let bytes = req.collect().await.map_err(|e| GatewayError::BadBody(e.to_string()))?.to_bytes();
    serde_json::from_slice(&bytes).map_err(|e| GatewayError::BadBody(e.to_string()))
}

#[allow(clippy::expect_used)]
fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<GatewayBody>, GatewayError> {
    let bytes = serde_json::to_vec(body).map_err(|e| GatewayError::BadBody(e.to_string()))?;
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(GatewayBody::new(Bytes::from(bytes)))
        .expect("static response is well-formed"))
}

#[derive(Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
}

fn error_response(err: &GatewayError) -> Response<GatewayBody> {
    let kind = err.kind();
    let status = StatusCode::from_u16(kind.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorBody { kind: format!("{kind:?}"), message: err.to_string() };
    let bytes = serde_json::to_vec(&body).unwrap_or_default();
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(GatewayBody::new(Bytes::from(bytes)))
        .unwrap_or_else(|_| Response::new(GatewayBody::new(Bytes::new())))
}

fn require_param(query: &[(String, String)], name: &'static str) -> Result<String, GatewayError> {
    param(query, name).ok_or(GatewayError::MissingParam(name))
}

fn param(query: &[(String, String)], name: &str) -> Option<String> {
    query.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
}

/// Minimal `application/x-www-form-urlencoded` query-string parser: splits
/// on `&`/`=` and decodes `%XX` escapes and `+` as space. Good enough for
/// the plain identifiers and flags this gateway's query parameters carry.
fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (percent_decode(k), percent_decode(v)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

fn percent_decode(value: &str) -> String {
    let mut out = Vec::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                if let Ok(byte) = u8::from_str_radix(std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or(""), 16) {
                    out.push(byte);
                    i += 3;
                } else {
                    out.push(bytes[i]);
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
#[path = "rest_tests.rs"]
mod tests;
