// SPDX-License-Identifier: MIT

//! `wharfd`: the multi-tenant session orchestrator control plane daemon.
//!
//! Boots the Kubernetes Runtime Adapter, the Session Registry, and the rest
//! of the `wharf-engine` components, then serves the control socket
//! (length-prefixed JSON over TCP) and the REST gateway (plain HTTP) side
//! by side until a shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use wharf_core::{Clock, Config, SystemClock};
use wharf_engine::{Broker, ConnectionPool, LifecycleManager, Proxy, Reaper, WorkerSpawner};
use wharf_runtime::{KubernetesRuntime, RuntimeAdapter};
use wharf_storage::SessionRegistry;

use wharf_daemon::env;
use wharf_daemon::listener::{ListenCtx, Listener};
use wharf_daemon::rest::{self, GatewayCtx};

#[derive(Parser, Debug)]
#[command(name = "wharfd", about = "Multi-tenant session orchestrator control plane")]
struct Args {
    /// Path to a TOML config file. Falls back to `WHARF_CONFIG`, then defaults.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config_path = args.config.or_else(env::config_path);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load config");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(config).await {
        error!(error = %err, "wharfd exited with an error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime: Arc<dyn RuntimeAdapter> = Arc::new(KubernetesRuntime::new(config.namespace.clone()).await?);

    let registry = match env::durable_log_path() {
        Some(path) => Arc::new(SessionRegistry::open_durable(path)?),
        None => Arc::new(SessionRegistry::new()),
    };

    let broker = Broker::new(256);
    let lifecycle = Arc::new(LifecycleManager::new(registry.clone(), runtime.clone(), broker.clone(), SystemClock));
    let pool = Arc::new(ConnectionPool::new(runtime.clone(), config.probe_interval(), config.probe_timeout()));
    let proxy = Arc::new(Proxy::new(registry.clone(), pool.clone(), wharf_engine::proxy::DEFAULT_UNARY_TIMEOUT));
    let orchestrator_api = format!("http://127.0.0.1:{}", config.http_port);
    let worker_spawner = Arc::new(WorkerSpawner::new(orchestrator_api, broker.clone()));
    let reaper = Reaper::new(registry.clone(), lifecycle.clone(), SystemClock, config.session_ttl_secs);

    let shutdown = CancellationToken::new();

    let reaper_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = reaper.run() => {}
                _ = shutdown.cancelled() => {}
            }
        })
    };

    let pool_sweep_task = {
        let pool = pool.clone();
        let shutdown = shutdown.clone();
        let sweep_interval = env::pool_sweep_interval();
        let idle_timeout = config.pool_idle_timeout();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => pool.evict_idle(idle_timeout, SystemClock.epoch_ms()),
                    _ = shutdown.cancelled() => return,
                }
            }
        })
    };

    let listen_ctx = Arc::new(ListenCtx {
        registry: registry.clone(),
        lifecycle: lifecycle.clone(),
        proxy: proxy.clone(),
        worker_spawner: worker_spawner.clone(),
        clock: SystemClock,
        ipc_timeout: env::ipc_timeout(),
        adapter_name: "kubernetes".to_string(),
    });
    let control_addr = SocketAddr::from(([0, 0, 0, 0], config.grpc_port));
    let control_listener = TcpListener::bind(control_addr).await?;
    info!(addr = %control_addr, "control socket listening");
    let socket_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(Listener::new(control_listener, listen_ctx, shutdown).run())
    };

    let gateway_ctx = Arc::new(GatewayCtx { registry, lifecycle, proxy, worker_spawner, clock: SystemClock, adapter_name: "kubernetes".to_string() });
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let http_listener = TcpListener::bind(http_addr).await?;
    info!(addr = %http_addr, "REST gateway listening");
    let http_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(run_gateway(http_listener, gateway_ctx, shutdown))
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received shutdown signal"),
    }
    shutdown.cancel();

    let grace = env::shutdown_grace();
    if tokio::time::timeout(grace, async {
        let _ = reaper_task.await;
        let _ = pool_sweep_task.await;
        let _ = socket_task.await;
        let _ = http_task.await;
    })
    .await
    .is_err()
    {
        warn!(?grace, "background tasks did not drain within the shutdown grace period");
    }

    runtime.close().await?;
    broker.shutdown();
    info!("wharfd shut down cleanly");
    Ok(())
}

async fn run_gateway(listener: TcpListener, ctx: Arc<GatewayCtx>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let ctx = ctx.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req| rest::serve(req, ctx.clone()));
                            if let Err(err) = AutoBuilder::new(TokioExecutor::new()).serve_connection(io, service).await {
                                warn!(error = %err, "REST connection error");
                            }
                        });
                    }
                    Err(err) => error!("REST gateway accept error: {err}"),
                }
            }
        }
    }
}
