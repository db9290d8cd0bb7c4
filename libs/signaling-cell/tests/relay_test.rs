use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use signaling_cell::models::{SignalFrame, SignalKind};
use signaling_cell::relay::{PeerSender, RoomRegistry};

fn peer() -> (Uuid, PeerSender, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Uuid::new_v4(), tx, rx)
}

#[tokio::test]
async fn broadcast_reaches_everyone_but_the_sender() {
    let registry = RoomRegistry::new();
    let (a_id, a_tx, mut a_rx) = peer();
    let (b_id, b_tx, mut b_rx) = peer();
    let (c_id, c_tx, mut c_rx) = peer();

    registry.join("room_1", a_id, a_tx).await;
    registry.join("room_1", b_id, b_tx).await;
    registry.join("room_1", c_id, c_tx).await;

    let delivered = registry
        .broadcast("room_1", a_id, r#"{"type":"offer"}"#.to_string())
        .await;
    assert_eq!(delivered, 2);

    assert_eq!(b_rx.try_recv().unwrap(), r#"{"type":"offer"}"#);
    assert_eq!(c_rx.try_recv().unwrap(), r#"{"type":"offer"}"#);
    assert!(a_rx.try_recv().is_err(), "sender must not hear its own frame");
}

#[tokio::test]
async fn rooms_are_isolated_from_each_other() {
    let registry = RoomRegistry::new();
    let (a_id, a_tx, _a_rx) = peer();
    let (b_id, b_tx, mut b_rx) = peer();

    registry.join("room_1", a_id, a_tx).await;
    registry.join("room_2", b_id, b_tx).await;

    let delivered = registry.broadcast("room_1", a_id, "hello".to_string()).await;
    assert_eq!(delivered, 0);
    assert!(b_rx.try_recv().is_err());
}

#[tokio::test]
async fn leaving_stops_delivery_and_empty_rooms_are_dropped() {
    let registry = RoomRegistry::new();
    let (a_id, a_tx, _a_rx) = peer();
    let (b_id, b_tx, mut b_rx) = peer();

    registry.join("room_1", a_id, a_tx).await;
    registry.join("room_1", b_id, b_tx).await;
    assert_eq!(registry.member_count("room_1").await, 2);

    registry.leave("room_1", b_id).await;
    assert_eq!(registry.member_count("room_1").await, 1);

    let delivered = registry.broadcast("room_1", a_id, "bye".to_string()).await;
    assert_eq!(delivered, 0);
    assert!(b_rx.try_recv().is_err());

    registry.leave("room_1", a_id).await;
    assert_eq!(registry.room_count().await, 0);
    assert_eq!(registry.member_count("room_1").await, 0);
}

#[tokio::test]
async fn rejoining_after_teardown_starts_a_fresh_room() {
    let registry = RoomRegistry::new();
    let (a_id, a_tx, _a_rx) = peer();

    registry.join("room_1", a_id, a_tx).await;
    registry.leave("room_1", a_id).await;
    assert_eq!(registry.room_count().await, 0);

    let (b_id, b_tx, _b_rx) = peer();
    registry.join("room_1", b_id, b_tx).await;
    assert_eq!(registry.room_count().await, 1);
    assert_eq!(registry.member_count("room_1").await, 1);
}

#[tokio::test]
async fn duplicate_join_does_not_duplicate_membership() {
    let registry = RoomRegistry::new();
    let (a_id, a_tx, mut a_rx) = peer();
    let (b_id, b_tx, _b_rx) = peer();

    registry.join("room_1", a_id, a_tx.clone()).await;
    registry.join("room_1", a_id, a_tx).await;
    registry.join("room_1", b_id, b_tx).await;
    assert_eq!(registry.member_count("room_1").await, 2);

    registry.broadcast("room_1", b_id, "ping".to_string()).await;
    assert_eq!(a_rx.try_recv().unwrap(), "ping");
    assert!(a_rx.try_recv().is_err(), "one join, one copy");
}

#[tokio::test]
async fn closed_peers_are_skipped_during_fanout() {
    let registry = RoomRegistry::new();
    let (a_id, a_tx, _a_rx) = peer();
    let (b_id, b_tx, b_rx) = peer();
    let (c_id, c_tx, mut c_rx) = peer();

    registry.join("room_1", a_id, a_tx).await;
    registry.join("room_1", b_id, b_tx).await;
    registry.join("room_1", c_id, c_tx).await;

    // B's connection died without a clean leave.
    drop(b_rx);

    let delivered = registry.broadcast("room_1", a_id, "still here".to_string()).await;
    assert_eq!(delivered, 1);
    assert_eq!(c_rx.try_recv().unwrap(), "still here");
}

#[test]
fn frames_parse_their_kebab_case_kinds() {
    let frame: SignalFrame =
        serde_json::from_str(r#"{"type":"join","roomId":"room_abc"}"#).unwrap();
    assert_eq!(frame.kind, SignalKind::Join);
    assert_eq!(frame.room_id.as_deref(), Some("room_abc"));
    assert!(frame.payload.is_none());

    let frame: SignalFrame = serde_json::from_str(
        r#"{"type":"ice-candidate","roomId":"room_abc","payload":{"candidate":"..."}}"#,
    )
    .unwrap();
    assert_eq!(frame.kind, SignalKind::IceCandidate);
    assert_eq!(frame.payload, Some(json!({"candidate": "..."})));

    let frame: SignalFrame =
        serde_json::from_str(r#"{"type":"chat-message","payload":{"text":"hi"}}"#).unwrap();
    assert_eq!(frame.kind, SignalKind::ChatMessage);
}

#[test]
fn unknown_kinds_and_malformed_frames_fail_to_parse() {
    assert!(serde_json::from_str::<SignalFrame>(r#"{"type":"subscribe"}"#).is_err());
    assert!(serde_json::from_str::<SignalFrame>(r#"{"roomId":"room_abc"}"#).is_err());
    assert!(serde_json::from_str::<SignalFrame>("not json at all").is_err());
}

#[test]
fn extra_fields_survive_parsing_for_dispatch() {
    // The relay forwards the original text; parsing just has to tolerate
    // whatever else clients put in the frame.
    let frame: SignalFrame = serde_json::from_str(
        r#"{"type":"offer","roomId":"room_abc","payload":{"sdp":"v=0"},"sender":"alice"}"#,
    )
    .unwrap();
    assert_eq!(frame.kind, SignalKind::Offer);
    assert!(frame.kind.is_relayed());
}

#[test]
fn join_frames_are_consumed_not_relayed() {
    assert!(!SignalKind::Join.is_relayed());
    for kind in [
        SignalKind::Offer,
        SignalKind::Answer,
        SignalKind::IceCandidate,
        SignalKind::ChatMessage,
    ] {
        assert!(kind.is_relayed());
    }
}
