use crate::error::{ProtocolError, SyncError};
use crate::models::IncomingConversation;
use crate::sync::AccountSession;

/// Boundary to the end-to-end encrypted messaging network.
///
/// Implementations wrap the external protocol SDK; the engine only ever asks
/// for the current conversation list and reconciles it locally.
#[allow(async_fn_in_trait)]
pub trait ProtocolClient {
    async fn list_conversations(
        &self,
        account: &str,
    ) -> Result<Vec<IncomingConversation>, ProtocolError>;
}

/// Fetch the current conversation list from the network and reconcile it into
/// the session's store and cache.
pub async fn sync_conversations<C: ProtocolClient>(
    session: &AccountSession,
    client: &C,
    force_update: bool,
) -> Result<(), SyncError> {
    let incoming = client.list_conversations(session.account()).await?;
    session.reconcile(incoming, force_update)
}
