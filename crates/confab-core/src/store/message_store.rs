use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::sync::Arc;

use crate::error::StoreError;
use crate::models::{ContentType, Message, MessageStatus};
use crate::store::Repository;

const MESSAGE_COLUMNS: &str =
    "id, conversation_topic, sent, sender_address, content, content_type, content_fallback, status";

/// Repository over the `message` table, keyed by `id`.
pub struct MessageStore {
    conn: Arc<Mutex<Connection>>,
}

impl MessageStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
        let content_type: String = row.get(5)?;
        let content_type = ContentType::parse(&content_type).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("unknown content type: {content_type}").into(),
            )
        })?;
        let status: String = row.get(7)?;
        let status = MessageStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                Type::Text,
                format!("unknown message status: {status}").into(),
            )
        })?;
        Ok(Message {
            id: row.get(0)?,
            conversation_topic: row.get(1)?,
            sent: row.get(2)?,
            sender_address: row.get(3)?,
            content: row.get(4)?,
            content_type,
            content_fallback: row.get(6)?,
            status,
        })
    }

    /// Messages of one conversation, oldest first.
    pub fn find_by_topic(&self, topic: &str) -> Result<Vec<Message>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM message WHERE conversation_topic = ?1 ORDER BY sent"
        ))?;
        let rows = stmt.query_map(params![topic], Self::row_to_message)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The newest message of every conversation (one row per topic).
    pub fn last_messages(&self) -> Result<Vec<Message>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM message m \
             WHERE m.sent = (SELECT MAX(m2.sent) FROM message m2 \
                             WHERE m2.conversation_topic = m.conversation_topic) \
             GROUP BY m.conversation_topic"
        ))?;
        let rows = stmt.query_map([], Self::row_to_message)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Move every message of `from_topic` to `to_topic`. Used when a pending
    /// conversation is upgraded, so message history stays continuous.
    /// Returns the number of messages moved.
    pub fn reassign_topic(&self, from_topic: &str, to_topic: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let moved = conn.execute(
            "UPDATE message SET conversation_topic = ?2 WHERE conversation_topic = ?1",
            params![from_topic, to_topic],
        )?;
        Ok(moved)
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM message", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl Repository for MessageStore {
    type Record = Message;

    fn upsert_all(&self, records: &[Message]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO message \
                     (id, conversation_topic, sent, sender_address, content, content_type, content_fallback, status) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(id) DO UPDATE SET \
                     conversation_topic = excluded.conversation_topic, \
                     sent = excluded.sent, \
                     sender_address = excluded.sender_address, \
                     content = excluded.content, \
                     content_type = excluded.content_type, \
                     content_fallback = excluded.content_fallback, \
                     status = excluded.status",
            )?;
            for m in records {
                stmt.execute(params![
                    m.id,
                    m.conversation_topic,
                    m.sent,
                    m.sender_address,
                    m.content,
                    m.content_type.as_str(),
                    m.content_fallback,
                    m.status.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
