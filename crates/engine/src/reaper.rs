// SPDX-License-Identifier: MIT

//! The TTL Reaper (C8): periodically sweeps the Registry for sessions idle
//! past their TTL and deletes them through the Lifecycle Manager.

use crate::lifecycle::LifecycleManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};
use wharf_core::Clock;
use wharf_storage::SessionRegistry;

/// Default sweep cadence; overridable by callers.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub struct Reaper<C: Clock> {
    registry: Arc<SessionRegistry>,
    lifecycle: Arc<LifecycleManager<C>>,
    clock: C,
    ttl_seconds: u64,
    sweep_interval: Duration,
}

impl<C: Clock> Reaper<C> {
    pub fn new(registry: Arc<SessionRegistry>, lifecycle: Arc<LifecycleManager<C>>, clock: C, ttl_seconds: u64) -> Self {
        Self { registry, lifecycle, clock, ttl_seconds, sweep_interval: DEFAULT_SWEEP_INTERVAL }
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Run the periodic sweep forever. Intended as the body of a dedicated
    /// background task; a failed reap is logged and never fatal to the
    /// loop.
    pub async fn run(self) {
        let mut ticker = interval(self.sweep_interval);
        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// Run a single sweep and return how many sessions were reaped.
    pub async fn sweep_once(&self) -> usize {
        let now_ms = self.clock.epoch_ms();
        let expired = self.registry.list_expired(self.ttl_seconds, now_ms);
        let mut reaped = 0;
        for session in expired {
            match self.lifecycle.delete(session.id, &session.owner_id, true).await {
                Ok(()) => {
                    reaped += 1;
                    info!(session = %session.id, "reaped idle session");
                }
                Err(err) => {
                    error!(session = %session.id, error = %err, "failed to reap idle session");
                }
            }
        }
        reaped
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
