pub mod conversation_store;
pub mod db;
pub mod message_store;
pub mod upsert;

pub use conversation_store::ConversationStore;
pub use db::Database;
pub use message_store::MessageStore;
pub use upsert::{upsert_batched, Repository};
