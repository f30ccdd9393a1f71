// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the daemon binary. `Config`
//! (in `wharf-core`) owns the `WHARF_*` overrides that shape the control
//! plane's own settings; this module covers the handful of process-level
//! knobs that sit outside the config file (paths, the listener's per-request
//! read timeout, shutdown grace).

use std::path::PathBuf;
use std::time::Duration;

/// Path to the TOML config file, if set.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("WHARF_CONFIG").ok().map(PathBuf::from)
}

/// Optional path to a durable JSONL mirror for the Session Registry.
pub fn durable_log_path() -> Option<PathBuf> {
    std::env::var("WHARF_DURABLE_LOG").ok().map(PathBuf::from)
}

/// Per-request read timeout on the control socket.
pub fn ipc_timeout() -> Duration {
    std::env::var("WHARF_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Grace period granted to in-flight requests after a shutdown signal
/// before the daemon forces an exit.
pub fn shutdown_grace() -> Duration {
    std::env::var("WHARF_SHUTDOWN_GRACE_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Interval between Connection Pool idle-eviction sweeps.
pub fn pool_sweep_interval() -> Duration {
    std::env::var("WHARF_POOL_SWEEP_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(60))
}
