//! Message structures and delivery status tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Message delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Sent by the local user, not yet delivered
    Sent,
    /// Delivered to the recipient's device
    Delivered,
    /// Read by the recipient
    Read,
    /// Incoming message from the remote party
    Received,
}

impl Default for MessageStatus {
    fn default() -> Self {
        Self::Sent
    }
}

impl MessageStatus {
    /// Position in the outgoing lifecycle, `None` for incoming messages
    fn outgoing_rank(self) -> Option<u8> {
        match self {
            Self::Sent => Some(0),
            Self::Delivered => Some(1),
            Self::Read => Some(2),
            Self::Received => None,
        }
    }

    /// Get human-readable delivery status indicator
    pub fn indicator(&self) -> &str {
        match self {
            Self::Sent => "✓",
            Self::Delivered => "✓✓",
            Self::Read => "✓✓ read",
            Self::Received => "",
        }
    }
}

/// Message kind tag selecting the renderer
///
/// Known tags map to dedicated variants. Anything else is kept verbatim in
/// `Unsupported` so it can be shown with a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    /// Plain text
    Text,
    /// Interactive button reply
    Button,
    /// Image attachment
    Image,
    /// Video attachment
    Video,
    /// Approved template message
    Template,
    /// Audio or voice note
    Audio,
    /// Shared location
    Location,
    /// Shared contact card
    Contact,
    /// Document attachment
    Document,
    /// Unrecognised tag
    Unsupported(String),
}

impl MessageType {
    /// Wire tag for this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Button => "button",
            Self::Image => "image",
            Self::Video => "video",
            Self::Template => "template",
            Self::Audio => "audio",
            Self::Location => "location",
            Self::Contact => "contact",
            Self::Document => "document",
            Self::Unsupported(tag) => tag,
        }
    }
}

impl From<&str> for MessageType {
    fn from(tag: &str) -> Self {
        match tag {
            "text" => Self::Text,
            "button" => Self::Button,
            "image" => Self::Image,
            "video" => Self::Video,
            "template" => Self::Template,
            "audio" => Self::Audio,
            "location" => Self::Location,
            "contact" => Self::Contact,
            "document" => Self::Document,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

impl From<String> for MessageType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID, unique within the conversation
    pub id: String,
    /// Owning conversation ID
    pub conversation_id: String,
    /// Send timestamp; `None` when absent or malformed
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub sent_at: Option<DateTime<Utc>>,
    /// Delivery status
    #[serde(default)]
    pub status: MessageStatus,
    /// Whether the local user sent this message
    #[serde(default)]
    pub from_me: bool,
    /// Renderer tag
    pub message_type: MessageType,
    /// Type-specific content
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Message {
    /// Create a text message from the remote party
    pub fn incoming(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        sent_at: DateTime<Utc>,
        body: &str,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            sent_at: Some(sent_at),
            status: MessageStatus::Received,
            from_me: false,
            message_type: MessageType::Text,
            payload: serde_json::json!({ "body": body }),
        }
    }

    /// Create a text message sent by the local user
    pub fn outgoing(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        sent_at: DateTime<Utc>,
        body: &str,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            sent_at: Some(sent_at),
            status: MessageStatus::Sent,
            from_me: true,
            message_type: MessageType::Text,
            payload: serde_json::json!({ "body": body }),
        }
    }

    /// Advance the delivery status
    ///
    /// Only self-sent messages move, and only forward along
    /// `sent -> delivered -> read`. Returns whether the status changed.
    pub fn advance_status(&mut self, next: MessageStatus) -> bool {
        if !self.from_me {
            return false;
        }
        match (self.status.outgoing_rank(), next.outgoing_rank()) {
            (Some(current), Some(target)) if target > current => {
                self.status = next;
                true
            }
            _ => false,
        }
    }
}

/// Accept RFC 3339 strings, map anything unparseable to `None`
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}
