//! Conversation reconciliation engine.
//!
//! Merges conversations reported by the protocol client against the local
//! store and the in-memory cache: decides insert vs. update, folds pending
//! placeholders in, resolves display titles from cached profile data, and
//! persists through the batched writer before the cache is updated, so the
//! UI never observes a conversation ahead of the store.

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::CoreConfig;
use crate::error::{StoreError, SyncError};
use crate::models::{resolve_conversation_title, Conversation, IncomingConversation, Message};
use crate::store::{upsert_batched, Database};
use crate::sync::chat_store::ChatStore;
use crate::sync::pending::upgrade_pending_if_needed;
use crate::sync::profiles::ProfileStore;
use crate::time::now_ms;

/// Per-account session owning the in-memory caches and the sole writer path
/// into the local store for conversation upserts. Created on login, torn down
/// on logout.
pub struct AccountSession {
    account: String,
    inbox_id: String,
    db: Database,
    chat: RwLock<ChatStore>,
    profiles: RwLock<ProfileStore>,
    /// Serializes `reconcile` calls for this account so overlapping sync
    /// triggers cannot interleave writes to the same topic.
    reconcile_gate: Mutex<()>,
}

impl AccountSession {
    /// Open the account's local store and rebuild the in-memory cache from
    /// it, so the conversation list is queryable before the first sync.
    pub fn open(config: &CoreConfig, account: &str, inbox_id: &str) -> Result<Self, StoreError> {
        let db = Database::open(&config.data_dir, account)?;

        let mut chat = ChatStore::new();
        chat.set_conversations(db.conversations().find_all()?);
        for message in db.messages().last_messages()? {
            chat.record_message(&message);
        }

        Ok(Self {
            account: account.to_string(),
            inbox_id: inbox_id.to_string(),
            db,
            chat: RwLock::new(chat),
            profiles: RwLock::new(ProfileStore::new()),
            reconcile_gate: Mutex::new(()),
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn inbox_id(&self) -> &str {
        &self.inbox_id
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn chat(&self) -> RwLockReadGuard<'_, ChatStore> {
        self.chat.read()
    }

    pub(crate) fn chat_mut(&self) -> RwLockWriteGuard<'_, ChatStore> {
        self.chat.write()
    }

    // ===== Cache Queries =====

    pub fn conversation(&self, topic: &str) -> Option<Conversation> {
        self.chat().conversation(topic).cloned()
    }

    pub fn conversation_count(&self) -> usize {
        self.chat().conversation_count()
    }

    /// All cached conversations, most recently created first.
    pub fn conversations(&self) -> Vec<Conversation> {
        self.chat().sorted_conversations().into_iter().cloned().collect()
    }

    pub fn last_message(&self, topic: &str) -> Option<Message> {
        self.chat().last_message(topic).cloned()
    }

    pub fn drain_pending_profile_refreshes(&self) -> Vec<String> {
        self.chat_mut().drain_pending_profile_refreshes()
    }

    // ===== Profile Cache =====

    /// Record the identity service's latest socials payload for a peer.
    pub fn set_profile(&self, peer_address: &str, socials_json: String, updated_at: i64) {
        self.profiles
            .write()
            .set_profile(peer_address, socials_json, updated_at);
    }

    // ===== Reconciliation =====

    /// Merge `incoming` conversations into the store and cache.
    ///
    /// Conversations whose topic is already cached are skipped unless
    /// `force_update` is set; either way their peers are still evaluated for
    /// a profile refresh. A store failure on the upsert path aborts the call
    /// (safe to retry); a profile-resolution failure only degrades that
    /// conversation's title.
    pub fn reconcile(
        &self,
        incoming: Vec<IncomingConversation>,
        force_update: bool,
    ) -> Result<(), SyncError> {
        let _gate = self.reconcile_gate.lock();

        let (mut to_upsert, known): (Vec<_>, Vec<_>) = {
            let chat = self.chat.read();
            incoming
                .into_iter()
                .partition(|c| force_update || !chat.contains_topic(&c.topic))
        };

        {
            let mut chat = self.chat.write();
            upgrade_pending_if_needed(&self.db, &mut chat, &mut to_upsert)?;
        }

        let conversations = self.db.conversations();
        let topics: Vec<String> = to_upsert.iter().map(|c| c.topic.clone()).collect();
        let existing: HashMap<String, Conversation> = conversations
            .find_by_topics(&topics)?
            .into_iter()
            .map(|c| (c.topic.clone(), c))
            .collect();

        let mut rows = Vec::with_capacity(to_upsert.len());
        {
            let profiles = self.profiles.read();
            for convo in &to_upsert {
                let prior = existing.get(&convo.topic);
                rows.push(merge_conversation(&profiles, convo, prior));
            }
        }

        // Persist before the cache so the UI never reads ahead of the store.
        upsert_batched(&conversations, &rows)?;
        let upserted = rows.len();

        let peers_to_check: Vec<String> = known
            .iter()
            .map(|c| c.peer_address.to_lowercase())
            .chain(rows.iter().map(|c| c.peer_address.clone()))
            .collect();

        self.chat.write().set_conversations(rows);

        // Schedule out-of-band profile refreshes last; never blocks display.
        let now = now_ms();
        let profiles = self.profiles.read();
        let mut chat = self.chat.write();
        for peer in &peers_to_check {
            if profiles.needs_refresh(peer, now) {
                chat.queue_profile_refresh(peer);
            }
        }

        debug!(
            account = %self.account,
            upserted,
            known = known.len(),
            "reconciled conversations"
        );
        Ok(())
    }

    // ===== Messages =====

    /// Persist messages (batched, keyed by id) and update each conversation's
    /// cached last message.
    pub fn save_messages(&self, messages: Vec<Message>) -> Result<(), SyncError> {
        upsert_batched(&self.db.messages(), &messages)?;
        let mut chat = self.chat.write();
        for message in &messages {
            chat.record_message(message);
        }
        Ok(())
    }
}

/// Build the store row for one incoming conversation, merging against the
/// prior row when there is one.
fn merge_conversation(
    profiles: &ProfileStore,
    incoming: &IncomingConversation,
    prior: Option<&Conversation>,
) -> Conversation {
    let prior_title = prior.and_then(|p| p.title.clone());
    let title = match profiles.socials(&incoming.peer_address) {
        Ok(Some(socials)) => {
            resolve_conversation_title(incoming.context_conversation_id.as_deref(), &socials)
                .or(prior_title)
        }
        Ok(None) => prior_title,
        Err(err) => {
            warn!(peer = %incoming.peer_address, %err, "profile resolution failed, keeping fallback title");
            prior_title
        }
    };

    // Never regress a non-zero watermark to zero.
    let read_until = if incoming.read_until > 0 {
        incoming.read_until
    } else {
        prior.map(|p| p.read_until).unwrap_or(0)
    };

    let created_at = match prior {
        Some(p) => p.created_at,
        None if incoming.created_at > 0 => incoming.created_at,
        None => now_ms(),
    };

    Conversation {
        topic: incoming.topic.clone(),
        peer_address: incoming.peer_address.to_lowercase(),
        context_conversation_id: incoming.context_conversation_id.clone(),
        title,
        read_until,
        pending: false,
        unread_override: prior.and_then(|p| p.unread_override),
        created_at,
    }
}
