//! User directory port - Host users, their permissions and assigned characters

use async_trait::async_trait;

use crate::domain::entities::UserInfo;
use crate::domain::value_objects::{ActorId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum UserDirectoryError {
    #[error("User not found: {0}")]
    NotFound(UserId),
}

#[async_trait]
pub trait UserDirectoryPort: Send + Sync {
    async fn get_user(&self, id: &UserId) -> Option<UserInfo>;

    /// Make the actor the user's assigned character
    async fn assign_character(&self, id: &UserId, actor_id: ActorId) -> Result<(), UserDirectoryError>;
}
