//! Application-wide constants
//!
//! Centralized location for magic values that are used across multiple
//! modules.

/// Maximum number of records written to the local store in a single batch.
/// Larger write sets are split into sequential chunks of this size to bound
/// peak memory and transaction size on constrained runtimes.
pub const UPSERT_BATCH_SIZE: usize = 5000;

/// A peer's cached profile is considered stale once it is older than this,
/// at which point a background refresh is scheduled during reconciliation.
pub const PROFILE_REFRESH_INTERVAL_MS: i64 = 24 * 3600 * 1000;

/// File name of the per-account chat database.
pub const CHAT_DB_FILE: &str = "chat.db";

/// Provisional topics of locally-created conversations start with this prefix
/// until the protocol confirms the conversation and assigns the real topic.
pub const PENDING_TOPIC_PREFIX: &str = "pending-";
