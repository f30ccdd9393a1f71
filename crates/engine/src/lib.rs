// SPDX-License-Identifier: MIT

//! wharf-engine: the stateful components that turn Registry records and a
//! Runtime Adapter into a running control plane — event fanout, session
//! lifecycle, request forwarding, connection pooling, worker spawning, and
//! TTL reaping.

pub mod broker;
pub mod lifecycle;
pub mod pool;
pub mod proxy;
pub mod reaper;
pub mod session_client;
pub mod worker_spawner;

pub use broker::Broker;
pub use lifecycle::{LifecycleError, LifecycleManager};
pub use pool::{ConnectionPool, PoolError, PoolStats};
pub use proxy::{Proxy, ProxyError, ProxyRequest, ProxyResponse};
pub use reaper::Reaper;
pub use worker_spawner::{ReportResultPayload, SpawnError, TaskDefinition, WorkerSpawner};
