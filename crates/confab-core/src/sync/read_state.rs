use tracing::debug;

use crate::error::SyncError;
use crate::sync::optimistic::commit_or_rollback;
use crate::sync::reconcile::AccountSession;

impl AccountSession {
    /// Whether a conversation should currently be shown as unread.
    pub fn is_unread(&self, topic: &str) -> bool {
        self.chat().is_unread(topic, self.inbox_id())
    }

    /// Advance every conversation's watermark to the newest `sent` among its
    /// messages (0 when it has none) and clear explicit unread flags.
    /// Store-side bulk operation; the cache is reloaded from the store after.
    pub fn mark_all_read(&self) -> Result<(), SyncError> {
        let conversations = self.database().conversations();
        conversations.mark_all_read()?;
        let rows = conversations.find_all()?;
        self.chat_mut().set_conversations(rows);
        Ok(())
    }

    /// Set one conversation's watermark and clear its unread flag.
    /// Unknown topic is a no-op, not a failure.
    pub fn mark_read_until(&self, topic: &str, read_until: i64) -> Result<(), SyncError> {
        let updated = self
            .database()
            .conversations()
            .update_read_until(topic, read_until)?;
        if updated == 0 {
            debug!(topic, "mark_read_until for unknown topic, ignoring");
            return Ok(());
        }
        if let Some(convo) = self.chat_mut().conversation_mut(topic) {
            convo.read_until = read_until;
            convo.unread_override = None;
        }
        Ok(())
    }

    /// Flag a conversation as unread regardless of its watermark.
    ///
    /// Optimistic: the cache is flipped before the store write; a failed
    /// write rolls the cache back to the snapshot and surfaces the error.
    /// Unknown topic is a no-op.
    pub fn mark_unread(&self, topic: &str) -> Result<(), SyncError> {
        let snapshot = {
            let mut chat = self.chat_mut();
            let Some(convo) = chat.conversation_mut(topic) else {
                debug!(topic, "mark_unread for unknown topic, ignoring");
                return Ok(());
            };
            let snapshot = convo.unread_override;
            convo.unread_override = Some(true);
            snapshot
        };

        let conversations = self.database().conversations();
        let restore = |previous: Option<bool>| {
            if let Some(convo) = self.chat_mut().conversation_mut(topic) {
                convo.unread_override = previous;
            }
        };

        let updated = commit_or_rollback(
            snapshot,
            || {
                conversations
                    .set_unread_override(topic, Some(true))
                    .map_err(SyncError::from)
            },
            restore,
        )?;

        if updated == 0 {
            // Cached but missing from the store: undo so the two stay in step.
            if let Some(convo) = self.chat_mut().conversation_mut(topic) {
                convo.unread_override = snapshot;
            }
            debug!(topic, "mark_unread for topic absent from store, ignoring");
        }
        Ok(())
    }
}
