use super::*;
use wharf_core::{FakeClock, OwnerId, SessionConfig};
use wharf_runtime::fake::FakeRuntime;

#[tokio::test]
async fn sweep_reaps_sessions_past_ttl_and_leaves_fresh_ones() {
    let clock = FakeClock::new();
    let registry = Arc::new(SessionRegistry::new());
    let runtime = Arc::new(FakeRuntime::new());
    let lifecycle = Arc::new(LifecycleManager::new(registry.clone(), runtime, crate::broker::Broker::new(16), clock.clone()));

    let stale = lifecycle.create(OwnerId::new("alice"), SessionConfig::default()).await.unwrap();
    clock.advance(Duration::from_secs(120));
    let fresh = lifecycle.create(OwnerId::new("alice"), SessionConfig::default()).await.unwrap();

    let reaper = Reaper::new(registry.clone(), lifecycle.clone(), clock, 60);
    let reaped = reaper.sweep_once().await;

    assert_eq!(reaped, 1);
    assert!(lifecycle.get(stale.id, &OwnerId::new("alice")).await.is_err());
    assert!(lifecycle.get(fresh.id, &OwnerId::new("alice")).await.is_ok());
}

#[tokio::test]
async fn sweep_with_nothing_expired_reaps_nothing() {
    let clock = FakeClock::new();
    let registry = Arc::new(SessionRegistry::new());
    let runtime = Arc::new(FakeRuntime::new());
    let lifecycle = Arc::new(LifecycleManager::new(registry.clone(), runtime, crate::broker::Broker::new(16), clock.clone()));

    lifecycle.create(OwnerId::new("alice"), SessionConfig::default()).await.unwrap();

    let reaper = Reaper::new(registry, lifecycle, clock, 3600);
    assert_eq!(reaper.sweep_once().await, 0);
}
