use uuid::Uuid;

use crate::time::now_ms;

/// Delivery state of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// Locally created, not yet acknowledged by the network.
    Sending,
    Sent,
    Error,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sending => "sending",
            MessageStatus::Sent => "sent",
            MessageStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sending" => Some(MessageStatus::Sending),
            "sent" => Some(MessageStatus::Sent),
            "error" => Some(MessageStatus::Error),
            _ => None,
        }
    }
}

/// Closed set of message content types.
///
/// Keeping this a tagged variant (rather than a free-form string) makes
/// rendering dispatch exhaustiveness-checkable. The protocol client maps any
/// content type outside this set to `Text` plus a `content_fallback` before
/// records reach this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Attachment,
    RemoteAttachment,
    Reaction,
    Reply,
    TransactionReference,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Attachment => "attachment",
            ContentType::RemoteAttachment => "remote_attachment",
            ContentType::Reaction => "reaction",
            ContentType::Reply => "reply",
            ContentType::TransactionReference => "transaction_reference",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ContentType::Text),
            "attachment" => Some(ContentType::Attachment),
            "remote_attachment" => Some(ContentType::RemoteAttachment),
            "reaction" => Some(ContentType::Reaction),
            "reply" => Some(ContentType::Reply),
            "transaction_reference" => Some(ContentType::TransactionReference),
            _ => None,
        }
    }
}

/// A chat message.
///
/// `id` is generated locally on send and confirmed by the protocol on
/// receipt; either way it is the primary key in the local store.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    /// Owning conversation topic.
    pub conversation_topic: String,
    /// Send timestamp in milliseconds.
    pub sent: i64,
    pub sender_address: String,
    pub content: String,
    pub content_type: ContentType,
    /// Human-readable stand-in when `content` cannot be rendered.
    pub content_fallback: Option<String>,
    pub status: MessageStatus,
}

impl Message {
    /// Build a locally-created text message in the `Sending` state.
    pub fn local(conversation_topic: &str, sender_address: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_topic: conversation_topic.to_string(),
            sent: now_ms(),
            sender_address: sender_address.to_string(),
            content: content.to_string(),
            content_type: ContentType::Text,
            content_fallback: None,
            status: MessageStatus::Sending,
        }
    }
}
