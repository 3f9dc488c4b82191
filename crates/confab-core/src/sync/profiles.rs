use std::collections::HashMap;

use crate::constants::PROFILE_REFRESH_INTERVAL_MS;
use crate::error::SyncError;
use crate::models::ProfileSocials;

/// Cached social payload for one peer, as last delivered by the identity
/// service.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    /// Raw JSON payload; parsed on demand so one malformed record cannot
    /// poison the cache.
    pub socials_json: String,
    /// When the identity service last refreshed this peer, in ms.
    pub updated_at: i64,
}

/// Read-only-from-the-sync-path profile cache, keyed by lowercased peer
/// address. Refreshes happen out-of-band; the reconciliation path only reads
/// what is already here.
#[derive(Default)]
pub struct ProfileStore {
    records: HashMap<String, ProfileRecord>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_profile(&mut self, peer_address: &str, socials_json: String, updated_at: i64) {
        self.records.insert(
            peer_address.to_lowercase(),
            ProfileRecord {
                socials_json,
                updated_at,
            },
        );
    }

    /// Parse the cached socials for `peer_address`.
    ///
    /// `Ok(None)` when the peer has never been fetched; an unparseable cached
    /// payload is the profile-resolution failure case and is non-fatal to
    /// callers.
    pub fn socials(&self, peer_address: &str) -> Result<Option<ProfileSocials>, SyncError> {
        match self.records.get(&peer_address.to_lowercase()) {
            None => Ok(None),
            Some(record) => serde_json::from_str(&record.socials_json)
                .map(Some)
                .map_err(|e| SyncError::ProfileResolution {
                    peer: peer_address.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn last_updated(&self, peer_address: &str) -> i64 {
        self.records
            .get(&peer_address.to_lowercase())
            .map(|r| r.updated_at)
            .unwrap_or(0)
    }

    /// Whether the peer's cached profile is stale at `now_ms` (never fetched
    /// counts as stale).
    pub fn needs_refresh(&self, peer_address: &str, now_ms: i64) -> bool {
        now_ms - self.last_updated(peer_address) >= PROFILE_REFRESH_INTERVAL_MS
    }
}
