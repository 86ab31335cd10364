// Message Tests - Testing Message, MessageStatus, and MessageType

use super::helpers::ts;
use crate::message::{Message, MessageStatus, MessageType};

fn parse(json: &str) -> Message {
    serde_json::from_str(json).expect("Failed to deserialize")
}

#[test]
fn test_deserialize_full_message() {
    let message = parse(
        r#"{
            "id": "m1",
            "conversation_id": "conv-1",
            "sent_at": "2024-01-01T10:00:00Z",
            "status": "delivered",
            "from_me": true,
            "message_type": "text",
            "payload": {"body": "hi"}
        }"#,
    );

    assert_eq!(message.sent_at, Some(ts("2024-01-01T10:00:00Z")));
    assert_eq!(message.status, MessageStatus::Delivered);
    assert!(message.from_me);
    assert_eq!(message.message_type, MessageType::Text);
    assert_eq!(message.payload["body"], "hi");
}

#[test]
fn test_sent_at_offset_is_normalised() {
    let message = parse(
        r#"{"id": "m1", "conversation_id": "c", "sent_at": "2024-01-01T12:00:00+02:00", "message_type": "text"}"#,
    );
    assert_eq!(message.sent_at, Some(ts("2024-01-01T10:00:00Z")));
}

#[test]
fn test_sent_at_epoch_millis() {
    let message = parse(
        r#"{"id": "m1", "conversation_id": "c", "sent_at": 1704103200000, "message_type": "text"}"#,
    );
    assert_eq!(message.sent_at, Some(ts("2024-01-01T10:00:00Z")));
}

#[test]
fn test_malformed_sent_at_becomes_none() {
    for raw in [r#""yesterday""#, "null", "true", r#"{"t": 1}"#] {
        let json = format!(
            r#"{{"id": "m1", "conversation_id": "c", "sent_at": {}, "message_type": "text"}}"#,
            raw
        );
        assert_eq!(parse(&json).sent_at, None, "sent_at = {}", raw);
    }
}

#[test]
fn test_missing_fields_use_defaults() {
    let message = parse(r#"{"id": "m1", "conversation_id": "c", "message_type": "image"}"#);

    assert_eq!(message.sent_at, None);
    assert_eq!(message.status, MessageStatus::Sent);
    assert!(!message.from_me);
    assert!(message.payload.is_null());
}

#[test]
fn test_unknown_type_is_preserved() {
    let message = parse(r#"{"id": "m1", "conversation_id": "c", "message_type": "sticker"}"#);
    assert_eq!(message.message_type, MessageType::Unsupported("sticker".to_string()));

    let json = serde_json::to_value(&message).expect("Failed to serialize");
    assert_eq!(json["message_type"], "sticker");
}

#[test]
fn test_message_type_tags() {
    for tag in [
        "text", "button", "image", "video", "template", "audio", "location", "contact", "document",
    ] {
        let kind = MessageType::from(tag);
        assert!(!matches!(kind, MessageType::Unsupported(_)), "{} is known", tag);
        assert_eq!(kind.as_str(), tag);
        assert_eq!(kind.to_string(), tag);
    }
    assert_eq!(String::from(MessageType::Location), "location");
}

#[test]
fn test_constructors() {
    let incoming = Message::incoming("a", "conv-1", ts("2024-01-01T10:00:00Z"), "hello");
    assert_eq!(incoming.status, MessageStatus::Received);
    assert!(!incoming.from_me);
    assert_eq!(incoming.payload["body"], "hello");

    let outgoing = Message::outgoing("b", "conv-1", ts("2024-01-01T10:00:00Z"), "hi");
    assert_eq!(outgoing.status, MessageStatus::Sent);
    assert!(outgoing.from_me);
}

#[test]
fn test_advance_status_moves_forward_only() {
    let mut message = Message::outgoing("b", "conv-1", ts("2024-01-01T10:00:00Z"), "hi");

    assert!(message.advance_status(MessageStatus::Delivered));
    assert!(message.advance_status(MessageStatus::Read));
    assert!(!message.advance_status(MessageStatus::Delivered));
    assert!(!message.advance_status(MessageStatus::Sent));
    assert!(!message.advance_status(MessageStatus::Received));
    assert_eq!(message.status, MessageStatus::Read);
}

#[test]
fn test_advance_status_skips_incoming() {
    let mut message = Message::incoming("a", "conv-1", ts("2024-01-01T10:00:00Z"), "hello");

    assert!(!message.advance_status(MessageStatus::Read));
    assert_eq!(message.status, MessageStatus::Received);
}

#[test]
fn test_status_indicator() {
    assert_eq!(MessageStatus::Sent.indicator(), "✓");
    assert_eq!(MessageStatus::Delivered.indicator(), "✓✓");
    assert_eq!(MessageStatus::Read.indicator(), "✓✓ read");
    assert_eq!(MessageStatus::Received.indicator(), "");
}
