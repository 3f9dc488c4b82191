//! Batched persistence writer.
//!
//! Large write sets are split into bounded chunks written strictly one after
//! another, trading throughput for a bounded peak transaction size on
//! constrained runtimes. A failing chunk aborts the remaining chunks and
//! surfaces the error; since every record is an idempotent upsert, the caller
//! can safely retry the whole call.

use crate::constants::UPSERT_BATCH_SIZE;
use crate::error::StoreError;

/// A keyed table that can absorb a batch of records with insert-or-update
/// semantics.
pub trait Repository {
    type Record;

    /// Upsert every record in `records`, in input order, inside a single
    /// transaction. A record whose unique key matches an existing row updates
    /// all non-key fields; otherwise it inserts.
    fn upsert_all(&self, records: &[Self::Record]) -> Result<(), StoreError>;
}

/// Write `records` to `repo` in sequential chunks of at most
/// [`UPSERT_BATCH_SIZE`] entries.
///
/// Input order is preserved, so within one call a later record overrides an
/// earlier one with the same key.
pub fn upsert_batched<R: Repository>(repo: &R, records: &[R::Record]) -> Result<(), StoreError> {
    for chunk in records.chunks(UPSERT_BATCH_SIZE) {
        repo.upsert_all(chunk)?;
    }
    Ok(())
}
