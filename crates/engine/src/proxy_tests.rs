use super::*;
use async_trait::async_trait;
use parking_lot::Mutex as PLMutex;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use wharf_core::{Session, SessionConfig, SessionState};
use wharf_runtime::{RuntimeAdapter, RuntimeError};

struct MockRuntime {
    endpoint: PLMutex<Option<String>>,
}

impl MockRuntime {
    fn new(endpoint: Option<String>) -> Arc<Self> {
        Arc::new(Self { endpoint: PLMutex::new(endpoint) })
    }
}

#[async_trait]
impl RuntimeAdapter for MockRuntime {
    async fn create_session(&self, _: SessionId, _: &OwnerId, _: &wharf_core::SessionConfig) -> Result<(), RuntimeError> {
        Ok(())
    }
    async fn wait_for_ready(&self, id: SessionId, _: Duration) -> Result<(), RuntimeError> {
        Err(RuntimeError::Timeout(id))
    }
    async fn get_status(&self, id: SessionId) -> Result<wharf_runtime::RuntimeStatus, RuntimeError> {
        Err(RuntimeError::NotFound(id))
    }
    async fn delete_session(&self, _: SessionId) -> Result<(), RuntimeError> {
        Ok(())
    }
    async fn get_endpoint(&self, id: SessionId) -> Result<String, RuntimeError> {
        self.endpoint.lock().clone().ok_or(RuntimeError::NotFound(id))
    }
    async fn list_sessions(&self) -> Result<Vec<SessionId>, RuntimeError> {
        Ok(Vec::new())
    }
    async fn health_check(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
    async fn close(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

fn running_session(owner: &OwnerId) -> Session {
    let mut session = Session::new(owner.clone(), SessionConfig::default(), 1_000);
    session.transition(SessionState::Running, 1_000);
    session
}

async fn serve_once(listener: TcpListener, response: &'static str) {
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = tokio::io::AsyncWriteExt::write_all(&mut socket, response.as_bytes()).await;
    });
}

#[tokio::test]
async fn proxy_forwards_to_session_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    serve_once(listener, "HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok").await;

    let owner = OwnerId::new("alice");
    let registry = Arc::new(SessionRegistry::new());
    let session = running_session(&owner);
    let id = session.id;
    registry.create(session).unwrap();

    let runtime = MockRuntime::new(Some(addr));
    let pool = Arc::new(ConnectionPool::new(runtime, Duration::from_secs(30), Duration::from_secs(5)));
    let proxy = Proxy::new(registry, pool, DEFAULT_UNARY_TIMEOUT);

    let request = ProxyRequest { method: "GET".to_string(), path: "/".to_string(), headers: vec![], body: None };
    let response = proxy.proxy(id, &owner, request, 2_000).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"ok");
}

#[tokio::test]
async fn proxy_rejects_unknown_session() {
    let owner = OwnerId::new("alice");
    let registry = Arc::new(SessionRegistry::new());
    let runtime = MockRuntime::new(None);
    let pool = Arc::new(ConnectionPool::new(runtime, Duration::from_secs(30), Duration::from_secs(5)));
    let proxy = Proxy::new(registry, pool, DEFAULT_UNARY_TIMEOUT);

    let request = ProxyRequest { method: "GET".to_string(), path: "/".to_string(), headers: vec![], body: None };
    let err = proxy.proxy(SessionId::new(), &owner, request, 1_000).await.unwrap_err();
    assert!(matches!(err, ProxyError::NotFound(_)));
}

#[tokio::test]
async fn proxy_rejects_non_running_session() {
    let owner = OwnerId::new("alice");
    let registry = Arc::new(SessionRegistry::new());
    let session = Session::new(owner.clone(), SessionConfig::default(), 1_000);
    let id = session.id;
    registry.create(session).unwrap();

    let runtime = MockRuntime::new(None);
    let pool = Arc::new(ConnectionPool::new(runtime, Duration::from_secs(30), Duration::from_secs(5)));
    let proxy = Proxy::new(registry, pool, DEFAULT_UNARY_TIMEOUT);

    let request = ProxyRequest { method: "GET".to_string(), path: "/".to_string(), headers: vec![], body: None };
    let err = proxy.proxy(id, &owner, request, 1_000).await.unwrap_err();
    assert!(matches!(err, ProxyError::FailedPrecondition(_)));
}

#[tokio::test]
async fn proxy_surfaces_backend_unavailability() {
    let owner = OwnerId::new("alice");
    let registry = Arc::new(SessionRegistry::new());
    let session = running_session(&owner);
    let id = session.id;
    registry.create(session).unwrap();

    let runtime = MockRuntime::new(None); // no endpoint known
    let pool = Arc::new(ConnectionPool::new(runtime, Duration::from_secs(30), Duration::from_secs(5)));
    let proxy = Proxy::new(registry, pool, DEFAULT_UNARY_TIMEOUT);

    let request = ProxyRequest { method: "GET".to_string(), path: "/".to_string(), headers: vec![], body: None };
    let err = proxy.proxy(id, &owner, request, 1_000).await.unwrap_err();
    assert!(matches!(err, ProxyError::Unavailable(_, _)));
}
