use super::*;
use std::time::Duration;

#[tokio::test]
async fn published_event_reaches_subscriber() {
    let broker: Broker<u32> = Broker::new(DEFAULT_CAPACITY);
    let mut rx = broker.subscribe(CancellationToken::new());
    broker.publish(42);
    assert_eq!(rx.recv().await, Some(42));
}

#[tokio::test]
async fn events_delivered_in_publication_order() {
    let broker: Broker<u32> = Broker::new(DEFAULT_CAPACITY);
    let mut rx = broker.subscribe(CancellationToken::new());
    broker.publish(1);
    broker.publish(2);
    broker.publish(3);
    assert_eq!(rx.recv().await, Some(1));
    assert_eq!(rx.recv().await, Some(2));
    assert_eq!(rx.recv().await, Some(3));
}

#[tokio::test]
async fn full_buffer_drops_for_that_subscriber_only_and_never_blocks() {
    let broker: Broker<u32> = Broker::new(1);
    let mut slow = broker.subscribe(CancellationToken::new());
    let mut fast = broker.subscribe(CancellationToken::new());

    broker.publish(1);
    // slow's buffer (capacity 1) is now full; this publish must still return
    // immediately rather than blocking on the full subscriber.
    broker.publish(2);

    assert_eq!(fast.recv().await, Some(1));
    assert_eq!(slow.recv().await, Some(1));
    assert_eq!(broker.drop_count(), 1);
}

#[tokio::test]
async fn cancelling_subscription_removes_it_and_stops_delivery() {
    let broker: Broker<u32> = Broker::new(DEFAULT_CAPACITY);
    let token = CancellationToken::new();
    let mut rx = broker.subscribe(token.clone());
    token.cancel();
    // allow the spawned removal task to run
    tokio::time::sleep(Duration::from_millis(20)).await;
    broker.publish(1);
    assert_eq!(rx.recv().await, None);
    assert_eq!(broker.subscriber_count(), 0);
}

#[tokio::test]
async fn shutdown_closes_existing_subscribers() {
    let broker: Broker<u32> = Broker::new(DEFAULT_CAPACITY);
    let mut rx = broker.subscribe(CancellationToken::new());
    broker.shutdown();
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn shutdown_rejects_later_subscribes_with_a_closed_stream() {
    let broker: Broker<u32> = Broker::new(DEFAULT_CAPACITY);
    broker.shutdown();
    let mut rx = broker.subscribe(CancellationToken::new());
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn distinct_subscribers_each_get_every_event() {
    let broker: Broker<u32> = Broker::new(DEFAULT_CAPACITY);
    let mut a = broker.subscribe(CancellationToken::new());
    let mut b = broker.subscribe(CancellationToken::new());
    broker.publish(7);
    assert_eq!(a.recv().await, Some(7));
    assert_eq!(b.recv().await, Some(7));
}
