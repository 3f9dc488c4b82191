pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod protocol;
pub mod store;
pub mod sync;
mod time;

pub use config::CoreConfig;
pub use error::{ProtocolError, StoreError, SyncError};
pub use models::{Conversation, ContentType, IncomingConversation, Message, MessageStatus};
pub use protocol::{sync_conversations, ProtocolClient};
pub use store::{upsert_batched, Database, Repository};
pub use sync::AccountSession;
