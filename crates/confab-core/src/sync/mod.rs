pub mod chat_store;
pub mod optimistic;
pub mod pending;
pub mod profiles;
pub mod read_state;
pub mod reconcile;

pub use chat_store::ChatStore;
pub use optimistic::commit_or_rollback;
pub use profiles::ProfileStore;
pub use reconcile::AccountSession;
