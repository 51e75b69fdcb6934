//! End-to-end tests through the local conductor.

use rxmux::{
    is_connected_to, CorrelationId, Image, LocalConductor, MemoryImage, Publication,
    RegistrationId, SessionId, StreamId, Subscription,
};
use std::sync::Arc;

const CHANNEL: &str = "aeron:udp?endpoint=localhost:40123";
const STREAM: StreamId = StreamId(1001);

fn make_image(session: i32, fragments: usize) -> Arc<MemoryImage> {
    let image = Arc::new(MemoryImage::new(
        SessionId(session),
        CorrelationId(session as i64 * 10),
        STREAM,
    ));
    for i in 0..fragments {
        image.offer(format!("{}:{}", session, i).into_bytes());
    }
    image
}

fn attach(conductor: &LocalConductor, image: &Arc<MemoryImage>) {
    conductor.on_available_image(CHANNEL, STREAM, image.clone());
}

fn poll_sessions(subscription: &Subscription, limit: usize) -> Vec<i32> {
    let mut seen = Vec::new();
    subscription.poll(|_, header| seen.push(header.session_id.0), limit);
    seen
}

#[test]
fn test_subscription_lifecycle() {
    let conductor = LocalConductor::new();
    let subscription = conductor.add_subscription(CHANNEL, STREAM);
    assert!(!subscription.has_images());
    assert_eq!(subscription.poll(|_, _| panic!("no images"), 10), 0);

    let image = make_image(1, 3);
    attach(&conductor, &image);
    assert!(subscription.has_images());

    let mut payloads = Vec::new();
    let read = subscription.poll(|data, _| payloads.push(data.to_vec()), 10);
    assert_eq!(read, 3);
    assert_eq!(payloads[0], b"1:0".to_vec());
    assert_eq!(payloads[2], b"1:2".to_vec());

    conductor.on_unavailable_image(image.correlation_id());
    assert!(!subscription.has_images());

    subscription.close();
    assert!(subscription.is_closed());
    assert_eq!(conductor.subscription_count(), 0);
}

#[test]
fn test_round_robin_across_polls() {
    let conductor = LocalConductor::new();
    let subscription = conductor.add_subscription(CHANNEL, STREAM);
    for session in [1, 2, 3] {
        attach(&conductor, &make_image(session, 10));
    }

    let order: Vec<i32> = (0..4)
        .flat_map(|_| poll_sessions(&subscription, 1))
        .collect();
    assert_eq!(order, vec![1, 2, 3, 1]);
}

#[test]
fn test_small_budget_does_not_starve_late_images() {
    let conductor = LocalConductor::new();
    let subscription = conductor.add_subscription(CHANNEL, STREAM);
    let images: Vec<_> = (1..=4).map(|session| make_image(session, 100)).collect();
    for image in &images {
        attach(&conductor, image);
    }

    // Budget of 5 is always exhausted by whichever image goes first
    for _ in 0..8 {
        assert_eq!(subscription.poll(|_, _| {}, 5), 5);
    }

    for image in &images {
        assert!(image.pending() < 100, "session {} starved", image.session_id());
    }
}

#[test]
fn test_swap_remove_reorders_service() {
    let conductor = LocalConductor::new();
    let subscription = conductor.add_subscription(CHANNEL, STREAM);
    for session in [1, 2, 3, 4] {
        attach(&conductor, &make_image(session, 10));
    }

    assert_eq!(poll_sessions(&subscription, 1), vec![1]);
    assert_eq!(poll_sessions(&subscription, 1), vec![2]);

    // Last image moves into the first slot: [4, 2, 3]
    conductor.on_unavailable_image(CorrelationId(10));

    let order: Vec<i32> = (0..4)
        .flat_map(|_| poll_sessions(&subscription, 1))
        .collect();
    assert_eq!(order, vec![3, 4, 4, 2]);
}

#[test]
fn test_session_reuse_keyed_by_correlation() {
    let conductor = LocalConductor::new();
    let subscription = conductor.add_subscription(CHANNEL, STREAM);

    let old = Arc::new(MemoryImage::new(SessionId(5), CorrelationId(1), STREAM));
    attach(&conductor, &old);
    conductor.on_unavailable_image(CorrelationId(1));

    // Same session, new lifecycle
    let new = Arc::new(MemoryImage::new(SessionId(5), CorrelationId(2), STREAM));
    attach(&conductor, &new);

    // A late detach for the old lifecycle must not drop the new image
    assert_eq!(conductor.on_unavailable_image(CorrelationId(1)), 0);
    assert!(subscription.has_image(SessionId(5)));
    assert_eq!(
        subscription
            .image_by_session_id(SessionId(5))
            .unwrap()
            .correlation_id(),
        CorrelationId(2)
    );
}

#[test]
fn test_is_connected_to_publication() {
    let conductor = LocalConductor::new();
    let subscription = conductor.add_subscription(CHANNEL, STREAM);
    let publication = Publication::new(CHANNEL, STREAM, SessionId(9), RegistrationId(77));

    assert!(!is_connected_to(&subscription, &publication));

    attach(&conductor, &make_image(9, 0));
    assert!(is_connected_to(&subscription, &publication));

    let elsewhere = conductor.add_subscription("aeron:ipc", STREAM);
    conductor.on_available_image("aeron:ipc", STREAM, make_image(9, 0));
    assert!(!is_connected_to(&elsewhere, &publication));
}

#[test]
fn test_close_detaches_images() {
    let conductor = LocalConductor::new();
    let subscription = conductor.add_subscription(CHANNEL, STREAM);
    let image = make_image(1, 5);
    attach(&conductor, &image);

    // A snapshot taken before close stays usable
    let held = subscription.images();
    subscription.close();

    assert!(!subscription.has_images());
    assert_eq!(held.len(), 1);
    let mut count = 0;
    held[0].poll(&mut |_, _| count += 1, 10);
    assert_eq!(count, 5);
}

#[test]
fn test_summary_serializes() {
    let conductor = LocalConductor::new();
    let subscription = conductor.add_subscription(CHANNEL, STREAM);
    attach(&conductor, &make_image(3, 0));

    let json = serde_json::to_value(subscription.summary()).unwrap();
    assert_eq!(json["registration_id"], 1);
    assert_eq!(json["channel"], CHANNEL);
    assert_eq!(json["stream_id"], 1001);
    assert_eq!(json["closed"], false);
    assert_eq!(json["images"][0]["session_id"], 3);
    assert_eq!(json["images"][0]["correlation_id"], 30);
}
