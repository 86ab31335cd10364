//! Per-type message rendering
//!
//! Rendering itself belongs to the host. This module fixes the dispatch:
//! every known [`MessageType`] has its own renderer method and anything
//! unrecognised goes to [`MessageRenderer::unsupported`], so adding a type
//! is a compile error until every renderer handles it.

use crate::message::{Message, MessageType};
use serde_json::Value;

/// Renderer capabilities, one per message type
///
/// Implementations must not panic on malformed payloads.
pub trait MessageRenderer {
    /// Rendered representation
    type Output;

    /// Plain text message
    fn text(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Button reply
    fn button(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Image attachment
    fn image(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Video attachment
    fn video(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Template message
    fn template(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Audio attachment
    fn audio(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Location pin
    fn location(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Contact card
    fn contact(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Document attachment
    fn document(&self, message: &Message, is_local: bool) -> Self::Output;
    /// Placeholder for types without a renderer
    fn unsupported(&self, message: &Message, tag: &str, is_local: bool) -> Self::Output;
}

/// Render `message` with the capability matching its type
pub fn dispatch<R: MessageRenderer>(renderer: &R, message: &Message, is_local: bool) -> R::Output {
    match &message.message_type {
        MessageType::Text => renderer.text(message, is_local),
        MessageType::Button => renderer.button(message, is_local),
        MessageType::Image => renderer.image(message, is_local),
        MessageType::Video => renderer.video(message, is_local),
        MessageType::Template => renderer.template(message, is_local),
        MessageType::Audio => renderer.audio(message, is_local),
        MessageType::Location => renderer.location(message, is_local),
        MessageType::Contact => renderer.contact(message, is_local),
        MessageType::Document => renderer.document(message, is_local),
        MessageType::Unsupported(tag) => renderer.unsupported(message, tag, is_local),
    }
}

/// One-line text rendering, used by the terminal panel
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl PlainTextRenderer {
    fn field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
        payload.get(key).and_then(Value::as_str)
    }

    fn attachment(kind: &str, payload: &Value) -> String {
        let caption = Self::field(payload, "caption")
            .or_else(|| Self::field(payload, "filename"))
            .unwrap_or("");
        if caption.is_empty() {
            format!("[{}]", kind)
        } else {
            format!("[{}] {}", kind, caption)
        }
    }
}

impl MessageRenderer for PlainTextRenderer {
    type Output = String;

    fn text(&self, message: &Message, _is_local: bool) -> String {
        Self::field(&message.payload, "body")
            .unwrap_or("(empty message)")
            .to_string()
    }

    fn button(&self, message: &Message, _is_local: bool) -> String {
        format!(
            "[button] {}",
            Self::field(&message.payload, "text").unwrap_or("?")
        )
    }

    fn image(&self, message: &Message, _is_local: bool) -> String {
        Self::attachment("image", &message.payload)
    }

    fn video(&self, message: &Message, _is_local: bool) -> String {
        Self::attachment("video", &message.payload)
    }

    fn template(&self, message: &Message, _is_local: bool) -> String {
        format!(
            "[template {}]",
            Self::field(&message.payload, "name").unwrap_or("unnamed")
        )
    }

    fn audio(&self, message: &Message, _is_local: bool) -> String {
        Self::attachment("audio", &message.payload)
    }

    fn location(&self, message: &Message, _is_local: bool) -> String {
        let lat = message.payload.get("latitude").and_then(Value::as_f64);
        let lon = message.payload.get("longitude").and_then(Value::as_f64);
        match (lat, lon) {
            (Some(lat), Some(lon)) => format!("[location] {:.5}, {:.5}", lat, lon),
            _ => "[location]".to_string(),
        }
    }

    fn contact(&self, message: &Message, _is_local: bool) -> String {
        format!(
            "[contact] {}",
            Self::field(&message.payload, "name").unwrap_or("unknown")
        )
    }

    fn document(&self, message: &Message, _is_local: bool) -> String {
        Self::attachment("document", &message.payload)
    }

    fn unsupported(&self, _message: &Message, tag: &str, _is_local: bool) -> String {
        format!("[unsupported message type: {}]", tag)
    }
}
