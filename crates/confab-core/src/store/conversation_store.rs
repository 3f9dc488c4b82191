use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::sync::Arc;

use crate::error::StoreError;
use crate::models::Conversation;
use crate::store::Repository;

const CONVERSATION_COLUMNS: &str =
    "topic, peer_address, context_conversation_id, title, read_until, pending, unread_override, created_at";

/// Repository over the `conversation` table, keyed by `topic`.
pub struct ConversationStore {
    conn: Arc<Mutex<Connection>>,
}

impl ConversationStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn row_to_conversation(row: &Row) -> rusqlite::Result<Conversation> {
        let unread_override: Option<i64> = row.get(6)?;
        Ok(Conversation {
            topic: row.get(0)?,
            peer_address: row.get(1)?,
            context_conversation_id: row.get(2)?,
            title: row.get(3)?,
            read_until: row.get(4)?,
            pending: row.get::<_, i64>(5)? != 0,
            unread_override: unread_override.map(|v| v != 0),
            created_at: row.get(7)?,
        })
    }

    pub fn find_all(&self) -> Result<Vec<Conversation>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversation ORDER BY created_at"
        ))?;
        let rows = stmt.query_map([], Self::row_to_conversation)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get(&self, topic: &str) -> Result<Option<Conversation>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversation WHERE topic = ?1"
        ))?;
        let mut rows = stmt.query_map(params![topic], Self::row_to_conversation)?;
        Ok(rows.next().transpose()?)
    }

    pub fn find_by_topics(&self, topics: &[String]) -> Result<Vec<Conversation>, StoreError> {
        if topics.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; topics.len()].join(", ");
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversation WHERE topic IN ({placeholders})"
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(topics.iter()), Self::row_to_conversation)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// All locally-created conversations still awaiting protocol confirmation.
    pub fn find_pending(&self) -> Result<Vec<Conversation>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversation WHERE pending = 1"
        ))?;
        let rows = stmt.query_map([], Self::row_to_conversation)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Set a single conversation's watermark and clear any explicit unread
    /// flag. Returns the number of rows touched (0 when the topic is unknown).
    pub fn update_read_until(&self, topic: &str, read_until: i64) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE conversation SET read_until = ?2, unread_override = NULL WHERE topic = ?1",
            params![topic, read_until],
        )?;
        Ok(updated)
    }

    /// Returns the number of rows touched (0 when the topic is unknown).
    pub fn set_unread_override(
        &self,
        topic: &str,
        unread_override: Option<bool>,
    ) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE conversation SET unread_override = ?2 WHERE topic = ?1",
            params![topic, unread_override.map(i64::from)],
        )?;
        Ok(updated)
    }

    /// Bulk watermark jump: every conversation's `read_until` becomes the
    /// maximum `sent` among its messages (0 if it has none), and explicit
    /// unread flags are cleared.
    pub fn mark_all_read(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE conversation SET \
                 read_until = (SELECT COALESCE(MAX(sent), 0) FROM message \
                               WHERE message.conversation_topic = conversation.topic), \
                 unread_override = NULL",
            [],
        )?;
        Ok(updated)
    }

    /// Remove a conversation row. Only used to discard upgraded pending
    /// placeholders; confirmed conversations are never deleted by this engine.
    pub fn delete(&self, topic: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM conversation WHERE topic = ?1", params![topic])?;
        Ok(deleted)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM conversation", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl Repository for ConversationStore {
    type Record = Conversation;

    fn upsert_all(&self, records: &[Conversation]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO conversation \
                     (topic, peer_address, context_conversation_id, title, read_until, pending, unread_override, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(topic) DO UPDATE SET \
                     peer_address = excluded.peer_address, \
                     context_conversation_id = excluded.context_conversation_id, \
                     title = excluded.title, \
                     read_until = excluded.read_until, \
                     pending = excluded.pending, \
                     unread_override = excluded.unread_override, \
                     created_at = excluded.created_at",
            )?;
            for c in records {
                stmt.execute(params![
                    c.topic,
                    c.peer_address,
                    c.context_conversation_id,
                    c.title,
                    c.read_until,
                    c.pending as i64,
                    c.unread_override.map(i64::from),
                    c.created_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
