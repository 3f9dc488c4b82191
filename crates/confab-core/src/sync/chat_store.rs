use std::collections::HashMap;

use crate::models::{Conversation, Message};

/// In-memory conversation table for one account: the reconciled view served
/// to the UI layer. Rebuilt from the local store on session open, updated
/// incrementally after every successful persistence.
///
/// Mutated only by the reconciliation engine and the read-state tracker;
/// always a single logical table keyed by topic.
#[derive(Default)]
pub struct ChatStore {
    conversations: HashMap<String, Conversation>,
    last_message_by_topic: HashMap<String, Message>,
    /// Peers whose profile should be refreshed out-of-band
    /// (drained by the application runtime).
    pending_profile_refreshes: Vec<String>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Query Methods =====

    pub fn conversation(&self, topic: &str) -> Option<&Conversation> {
        self.conversations.get(topic)
    }

    pub fn contains_topic(&self, topic: &str) -> bool {
        self.conversations.contains_key(topic)
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }

    pub fn last_message(&self, topic: &str) -> Option<&Message> {
        self.last_message_by_topic.get(topic)
    }

    /// All conversations, most recently created first.
    pub fn sorted_conversations(&self) -> Vec<&Conversation> {
        let mut all: Vec<&Conversation> = self.conversations.values().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    pub fn is_unread(&self, topic: &str, current_inbox_id: &str) -> bool {
        match self.conversations.get(topic) {
            Some(convo) => convo.is_unread(self.last_message(topic), current_inbox_id),
            None => false,
        }
    }

    // ===== Mutation Methods =====

    /// Insert or replace conversations keyed by topic.
    pub fn set_conversations(&mut self, conversations: Vec<Conversation>) {
        for convo in conversations {
            self.conversations.insert(convo.topic.clone(), convo);
        }
    }

    pub fn conversation_mut(&mut self, topic: &str) -> Option<&mut Conversation> {
        self.conversations.get_mut(topic)
    }

    pub fn remove(&mut self, topic: &str) -> Option<Conversation> {
        self.last_message_by_topic.remove(topic);
        self.conversations.remove(topic)
    }

    /// Move the cached last message of `from_topic` under `to_topic`
    /// (pending-upgrade re-keying). Keeps whichever message is newer if
    /// `to_topic` already has one.
    pub fn reassign_topic(&mut self, from_topic: &str, to_topic: &str) {
        if let Some(mut message) = self.last_message_by_topic.remove(from_topic) {
            message.conversation_topic = to_topic.to_string();
            self.record_message(&message);
        }
    }

    /// Track `message` as its conversation's last message if it is the newest
    /// seen so far.
    pub fn record_message(&mut self, message: &Message) {
        match self.last_message_by_topic.get(&message.conversation_topic) {
            Some(current) if current.sent >= message.sent => {}
            _ => {
                self.last_message_by_topic
                    .insert(message.conversation_topic.clone(), message.clone());
            }
        }
    }

    pub fn queue_profile_refresh(&mut self, peer_address: &str) {
        if !self
            .pending_profile_refreshes
            .iter()
            .any(|p| p == peer_address)
        {
            self.pending_profile_refreshes.push(peer_address.to_string());
        }
    }

    /// Drain peers queued for an out-of-band profile refresh (called by the
    /// application runtime after a reconcile pass).
    pub fn drain_pending_profile_refreshes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_profile_refreshes)
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
        self.last_message_by_topic.clear();
        self.pending_profile_refreshes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, MessageStatus};

    fn conversation(topic: &str, created_at: i64) -> Conversation {
        Conversation {
            topic: topic.to_string(),
            peer_address: "0xbeef".to_string(),
            context_conversation_id: None,
            title: None,
            read_until: 0,
            pending: false,
            unread_override: None,
            created_at,
        }
    }

    fn message(id: &str, topic: &str, sent: i64) -> Message {
        Message {
            id: id.to_string(),
            conversation_topic: topic.to_string(),
            sent,
            sender_address: "0xbeef".to_string(),
            content: "hi".to_string(),
            content_type: ContentType::Text,
            content_fallback: None,
            status: MessageStatus::Sent,
        }
    }

    #[test]
    fn test_set_conversations_replaces_by_topic() {
        let mut store = ChatStore::new();
        store.set_conversations(vec![conversation("t1", 1), conversation("t2", 2)]);
        store.set_conversations(vec![conversation("t1", 9)]);

        assert_eq!(store.conversation_count(), 2);
        assert_eq!(store.conversation("t1").unwrap().created_at, 9);
    }

    #[test]
    fn test_record_message_keeps_newest() {
        let mut store = ChatStore::new();
        store.record_message(&message("m1", "t1", 200));
        store.record_message(&message("m2", "t1", 100));

        assert_eq!(store.last_message("t1").unwrap().id, "m1");
    }

    #[test]
    fn test_reassign_topic_moves_last_message() {
        let mut store = ChatStore::new();
        store.record_message(&message("m1", "pending-x", 100));
        store.reassign_topic("pending-x", "t1");

        assert!(store.last_message("pending-x").is_none());
        let last = store.last_message("t1").unwrap();
        assert_eq!(last.id, "m1");
        assert_eq!(last.conversation_topic, "t1");
    }

    #[test]
    fn test_profile_refresh_queue_dedupes_and_drains() {
        let mut store = ChatStore::new();
        store.queue_profile_refresh("0xbeef");
        store.queue_profile_refresh("0xbeef");
        store.queue_profile_refresh("0xd00d");

        assert_eq!(store.drain_pending_profile_refreshes(), vec!["0xbeef", "0xd00d"]);
        assert!(store.drain_pending_profile_refreshes().is_empty());
    }

    #[test]
    fn test_sorted_conversations_newest_first() {
        let mut store = ChatStore::new();
        store.set_conversations(vec![conversation("t1", 1), conversation("t2", 5)]);
        let sorted = store.sorted_conversations();
        assert_eq!(sorted[0].topic, "t2");
    }
}
