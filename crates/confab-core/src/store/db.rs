use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

use crate::constants::CHAT_DB_FILE;
use crate::error::StoreError;
use crate::store::{ConversationStore, MessageStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS conversation (
    topic TEXT PRIMARY KEY,
    peer_address TEXT NOT NULL,
    context_conversation_id TEXT,
    title TEXT,
    read_until INTEGER NOT NULL DEFAULT 0,
    pending INTEGER NOT NULL DEFAULT 0,
    unread_override INTEGER,
    created_at INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS message (
    id TEXT PRIMARY KEY,
    conversation_topic TEXT NOT NULL,
    sent INTEGER NOT NULL,
    sender_address TEXT NOT NULL,
    content TEXT NOT NULL,
    content_type TEXT NOT NULL,
    content_fallback TEXT,
    status TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_message_conversation_sent
    ON message (conversation_topic, sent);
"#;

/// Per-account local store handle. Cheap to clone (Arc internally).
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the chat database for `account` under `data_dir`.
    ///
    /// WAL journal mode is set at connection time; the schema is created on
    /// first open and is otherwise a no-op.
    pub fn open<P: AsRef<Path>>(data_dir: P, account: &str) -> Result<Self, StoreError> {
        let dir = data_dir.as_ref().join(account);
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let conn = Connection::open(dir.join(CHAT_DB_FILE))?;
        // journal_mode returns a row, so query_row instead of execute.
        let _: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn conversations(&self) -> ConversationStore {
        ConversationStore::new(self.conn.clone())
    }

    pub fn messages(&self) -> MessageStore {
        MessageStore::new(self.conn.clone())
    }

    #[cfg(test)]
    pub(crate) fn raw_connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_account_database() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path(), "0xcafe").unwrap();

        assert!(dir.path().join("0xcafe").join(CHAT_DB_FILE).exists());
        assert!(db.conversations().find_all().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_existing_schema() {
        let dir = tempdir().unwrap();
        {
            let _db = Database::open(dir.path(), "0xcafe").unwrap();
        }
        let db = Database::open(dir.path(), "0xcafe").unwrap();
        assert!(db.conversations().find_all().unwrap().is_empty());
    }
}
