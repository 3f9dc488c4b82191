use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::constants::PENDING_TOPIC_PREFIX;
use crate::error::{StoreError, SyncError};
use crate::models::{Conversation, IncomingConversation};
use crate::store::{Database, Repository};
use crate::sync::chat_store::ChatStore;
use crate::sync::reconcile::AccountSession;
use crate::time::now_ms;

impl AccountSession {
    /// Create a local-only conversation placeholder with a provisional topic,
    /// to be upgraded once the protocol confirms a matching conversation.
    pub fn create_pending_conversation(
        &self,
        peer_address: &str,
        context_conversation_id: Option<String>,
    ) -> Result<Conversation, SyncError> {
        let convo = Conversation {
            topic: format!("{PENDING_TOPIC_PREFIX}{}", Uuid::new_v4()),
            peer_address: peer_address.to_lowercase(),
            context_conversation_id,
            title: None,
            read_until: 0,
            pending: true,
            unread_override: None,
            created_at: now_ms(),
        };
        self.database()
            .conversations()
            .upsert_all(std::slice::from_ref(&convo))?;
        self.chat_mut().set_conversations(vec![convo.clone()]);
        Ok(convo)
    }
}

/// Fold pending placeholders into matching newly-confirmed conversations.
///
/// Runs before persistence within a reconcile pass. For each incoming
/// conversation with a matching placeholder (same normalized participant set
/// and context id), the placeholder's identity is merged into the confirmed
/// record (the confirmed topic wins), its messages are re-keyed to the
/// confirmed topic, and the placeholder is discarded. Idempotent: once the
/// placeholder row is gone a second pass finds nothing to merge.
pub(crate) fn upgrade_pending_if_needed(
    db: &Database,
    chat: &mut ChatStore,
    incoming: &mut [IncomingConversation],
) -> Result<(), StoreError> {
    let pending = db.conversations().find_pending()?;
    if pending.is_empty() {
        return Ok(());
    }

    let conversations = db.conversations();
    let messages = db.messages();
    let mut consumed: HashSet<String> = HashSet::new();

    for convo in incoming.iter_mut() {
        let Some(placeholder) = pending
            .iter()
            .find(|p| !consumed.contains(&p.topic) && matches_pending(p, convo))
        else {
            continue;
        };

        let moved = messages.reassign_topic(&placeholder.topic, &convo.topic)?;
        conversations.delete(&placeholder.topic)?;
        chat.remove(&placeholder.topic);
        chat.reassign_topic(&placeholder.topic, &convo.topic);

        if convo.context_conversation_id.is_none() {
            convo.context_conversation_id = placeholder.context_conversation_id.clone();
        }
        consumed.insert(placeholder.topic.clone());

        debug!(
            pending_topic = %placeholder.topic,
            topic = %convo.topic,
            moved_messages = moved,
            "upgraded pending conversation"
        );
    }

    Ok(())
}

/// A placeholder matches when the participant set is the same (peer addresses
/// compared case-insensitively) and the context id agrees: either equal, or
/// absent on the incoming side and inherited from the placeholder.
fn matches_pending(placeholder: &Conversation, incoming: &IncomingConversation) -> bool {
    if !placeholder.pending {
        return false;
    }
    if !placeholder
        .peer_address
        .eq_ignore_ascii_case(&incoming.peer_address)
    {
        return false;
    }
    incoming.context_conversation_id.is_none()
        || placeholder.context_conversation_id == incoming.context_conversation_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, Message, MessageStatus};
    use crate::store::Database;
    use tempfile::tempdir;

    fn incoming(topic: &str, peer: &str, context: Option<&str>) -> IncomingConversation {
        IncomingConversation {
            topic: topic.to_string(),
            peer_address: peer.to_string(),
            context_conversation_id: context.map(|s| s.to_string()),
            read_until: 0,
            created_at: 1,
        }
    }

    fn pending_row(topic: &str, peer: &str, context: Option<&str>) -> Conversation {
        Conversation {
            topic: topic.to_string(),
            peer_address: peer.to_string(),
            context_conversation_id: context.map(|s| s.to_string()),
            title: None,
            read_until: 0,
            pending: true,
            unread_override: None,
            created_at: 1,
        }
    }

    fn draft(id: &str, topic: &str, sent: i64) -> Message {
        Message {
            id: id.to_string(),
            conversation_topic: topic.to_string(),
            sent,
            sender_address: "0xcafe".to_string(),
            content: "draft".to_string(),
            content_type: ContentType::Text,
            content_fallback: None,
            status: MessageStatus::Sending,
        }
    }

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path(), "0xcafe").unwrap();
        (dir, db)
    }

    #[test]
    fn test_upgrade_rekeys_messages_and_discards_placeholder() {
        let (_dir, db) = open();
        let mut chat = ChatStore::new();

        let placeholder = pending_row("pending-1", "0xbeef", Some("x"));
        db.conversations()
            .upsert_all(std::slice::from_ref(&placeholder))
            .unwrap();
        chat.set_conversations(vec![placeholder]);
        db.messages()
            .upsert_all(&[draft("m1", "pending-1", 100)])
            .unwrap();
        chat.record_message(&draft("m1", "pending-1", 100));

        let mut batch = vec![incoming("t1", "0xBEEF", Some("x"))];
        upgrade_pending_if_needed(&db, &mut chat, &mut batch).unwrap();

        assert!(db.conversations().get("pending-1").unwrap().is_none());
        assert_eq!(db.messages().find_by_topic("t1").unwrap().len(), 1);
        assert!(db.messages().find_by_topic("pending-1").unwrap().is_empty());
        assert!(chat.conversation("pending-1").is_none());
        assert_eq!(chat.last_message("t1").unwrap().id, "m1");
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let (_dir, db) = open();
        let mut chat = ChatStore::new();

        db.conversations()
            .upsert_all(&[pending_row("pending-1", "0xbeef", Some("x"))])
            .unwrap();
        db.messages()
            .upsert_all(&[draft("m1", "pending-1", 100)])
            .unwrap();

        let mut batch = vec![incoming("t1", "0xbeef", Some("x"))];
        upgrade_pending_if_needed(&db, &mut chat, &mut batch).unwrap();
        upgrade_pending_if_needed(&db, &mut chat, &mut batch).unwrap();

        assert_eq!(db.messages().find_by_topic("t1").unwrap().len(), 1);
        assert_eq!(db.messages().count().unwrap(), 1);
        assert!(db.conversations().get("pending-1").unwrap().is_none());
    }

    #[test]
    fn test_context_mismatch_does_not_match() {
        let (_dir, db) = open();
        let mut chat = ChatStore::new();

        db.conversations()
            .upsert_all(&[pending_row("pending-1", "0xbeef", Some("x"))])
            .unwrap();

        let mut batch = vec![incoming("t1", "0xbeef", Some("y"))];
        upgrade_pending_if_needed(&db, &mut chat, &mut batch).unwrap();

        assert!(db.conversations().get("pending-1").unwrap().is_some());
    }

    #[test]
    fn test_missing_incoming_context_inherits_from_placeholder() {
        let (_dir, db) = open();
        let mut chat = ChatStore::new();

        db.conversations()
            .upsert_all(&[pending_row("pending-1", "0xbeef", Some("x"))])
            .unwrap();

        let mut batch = vec![incoming("t1", "0xbeef", None)];
        upgrade_pending_if_needed(&db, &mut chat, &mut batch).unwrap();

        assert_eq!(batch[0].context_conversation_id.as_deref(), Some("x"));
        assert!(db.conversations().get("pending-1").unwrap().is_none());
    }

    #[test]
    fn test_placeholder_consumed_once_per_pass() {
        let (_dir, db) = open();
        let mut chat = ChatStore::new();

        db.conversations()
            .upsert_all(&[pending_row("pending-1", "0xbeef", None)])
            .unwrap();
        db.messages()
            .upsert_all(&[draft("m1", "pending-1", 100)])
            .unwrap();

        let mut batch = vec![incoming("t1", "0xbeef", None), incoming("t2", "0xbeef", None)];
        upgrade_pending_if_needed(&db, &mut chat, &mut batch).unwrap();

        // Only the first incoming conversation absorbed the placeholder.
        assert_eq!(db.messages().find_by_topic("t1").unwrap().len(), 1);
        assert!(db.messages().find_by_topic("t2").unwrap().is_empty());
    }
}
