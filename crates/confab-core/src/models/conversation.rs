use super::message::Message;

/// A conversation as held in the local store and the in-memory cache.
///
/// Exactly one record exists per `topic`; reconciliation upserts by topic and
/// never creates duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    /// Unique stable identifier, primary key.
    pub topic: String,
    /// Counterparty address (lowercased on write).
    pub peer_address: String,
    /// Optional application-level grouping id.
    pub context_conversation_id: Option<String>,
    /// Resolved display name; stays `None` until a handle/name is known.
    pub title: Option<String>,
    /// Watermark in milliseconds: messages with `sent <= read_until` are read.
    pub read_until: i64,
    /// Locally created and not yet confirmed by the protocol.
    pub pending: bool,
    /// Explicit user "mark as unread", independent of the watermark.
    pub unread_override: Option<bool>,
    pub created_at: i64,
}

impl Conversation {
    /// Whether this conversation should be shown as unread.
    ///
    /// Unread iff the user explicitly flagged it, or the last message is past
    /// the watermark and was not sent by the current user.
    pub fn is_unread(&self, last_message: Option<&Message>, current_inbox_id: &str) -> bool {
        if self.unread_override == Some(true) {
            return true;
        }
        match last_message {
            Some(last) => {
                last.sent > self.read_until && last.sender_address != current_inbox_id
            }
            None => false,
        }
    }
}

/// A conversation as reported by the protocol client.
#[derive(Debug, Clone)]
pub struct IncomingConversation {
    pub topic: String,
    pub peer_address: String,
    pub context_conversation_id: Option<String>,
    /// Watermark reported by the network; 0 means "unknown" and never
    /// overwrites a non-zero stored value.
    pub read_until: i64,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::{ContentType, MessageStatus};

    fn conversation(read_until: i64) -> Conversation {
        Conversation {
            topic: "t1".to_string(),
            peer_address: "0xbeef".to_string(),
            context_conversation_id: None,
            title: None,
            read_until,
            pending: false,
            unread_override: None,
            created_at: 0,
        }
    }

    fn message(sent: i64, sender: &str) -> Message {
        Message {
            id: "m1".to_string(),
            conversation_topic: "t1".to_string(),
            sent,
            sender_address: sender.to_string(),
            content: "hi".to_string(),
            content_type: ContentType::Text,
            content_fallback: None,
            status: MessageStatus::Sent,
        }
    }

    #[test]
    fn test_unread_when_last_message_past_watermark() {
        let convo = conversation(100);
        let last = message(150, "0xBEEF");
        assert!(convo.is_unread(Some(&last), "0xCAFE"));
    }

    #[test]
    fn test_read_when_watermark_covers_last_message() {
        let convo = conversation(200);
        let last = message(150, "0xBEEF");
        assert!(!convo.is_unread(Some(&last), "0xCAFE"));
    }

    #[test]
    fn test_own_messages_never_count_as_unread() {
        let convo = conversation(100);
        let last = message(150, "0xCAFE");
        assert!(!convo.is_unread(Some(&last), "0xCAFE"));
    }

    #[test]
    fn test_unread_override_wins_over_watermark() {
        let mut convo = conversation(200);
        convo.unread_override = Some(true);
        let last = message(150, "0xBEEF");
        assert!(convo.is_unread(Some(&last), "0xCAFE"));
    }

    #[test]
    fn test_override_false_falls_through_to_watermark() {
        let mut convo = conversation(100);
        convo.unread_override = Some(false);
        let last = message(150, "0xBEEF");
        assert!(convo.is_unread(Some(&last), "0xCAFE"));
    }

    #[test]
    fn test_no_messages_is_not_unread() {
        let convo = conversation(0);
        assert!(!convo.is_unread(None, "0xCAFE"));
    }
}
