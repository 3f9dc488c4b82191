use std::path::PathBuf;
use thiserror::Error;

/// Errors from the local store adapter.
///
/// Fatal to the call that hit them: partial conversation state is worse than
/// a retry. Every write path is upsert-based, so the failed call is safe to
/// retry as a whole.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error reported by a protocol client implementation.
#[derive(Debug, Error)]
#[error("protocol client error: {0}")]
pub struct ProtocolError(pub String);

/// Errors surfaced by the synchronization engine.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Non-fatal inside reconciliation: the conversation keeps its existing
    /// or fallback title and the batch continues.
    #[error("could not resolve profile socials for {peer}: {reason}")]
    ProfileResolution { peer: String, reason: String },
}
