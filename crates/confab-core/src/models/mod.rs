pub mod conversation;
pub mod message;
pub mod profile;

pub use conversation::{Conversation, IncomingConversation};
pub use message::{ContentType, Message, MessageStatus};
pub use profile::{resolve_conversation_title, EnsName, LensHandle, ProfileSocials, UnstoppableDomain};
