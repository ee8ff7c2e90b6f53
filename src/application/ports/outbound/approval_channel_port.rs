//! Approval channel port - Broadcast bus for the character approval protocol

use async_trait::async_trait;

use crate::application::dto::ApprovalMessage;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("No listeners on the approval channel")]
    NoListeners,
}

/// Every connected session receives every published message and decides
/// locally whether to act on it.
#[async_trait]
pub trait ApprovalChannelPort: Send + Sync {
    async fn publish(&self, message: ApprovalMessage) -> Result<(), ChannelError>;
}
