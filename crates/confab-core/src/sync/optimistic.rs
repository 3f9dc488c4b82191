//! Optimistic-update helper.
//!
//! Every mutation with a remote/persistence confirmation step follows the
//! same three-step protocol: snapshot the previous state, apply the mutation
//! immediately, then commit, rolling back to the snapshot if the confirming
//! call fails.

/// Run `persist` after the caller has already applied an optimistic mutation.
///
/// On failure, `rollback` receives the pre-mutation `snapshot` and the error
/// is surfaced unchanged.
pub fn commit_or_rollback<S, T, E>(
    snapshot: S,
    persist: impl FnOnce() -> Result<T, E>,
    rollback: impl FnOnce(S),
) -> Result<T, E> {
    match persist() {
        Ok(value) => Ok(value),
        Err(err) => {
            rollback(snapshot);
            Err(err)
        }
    }
}
