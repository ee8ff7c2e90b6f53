//! Actor repository port - Persistence of character actors and their embedded items

use async_trait::async_trait;

use crate::domain::entities::{Actor, CharacterDraft, Favorite, OwnedItem};
use crate::domain::value_objects::{ActorId, Currency, ItemId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum ActorStoreError {
    #[error("Actor not found: {0}")]
    NotFound(ActorId),
    #[error("Embedded item id already in use: {0}")]
    DuplicateItem(ItemId),
    #[error("Currency of actor {0} would overflow")]
    CurrencyOverflow(ActorId),
}

#[async_trait]
pub trait ActorRepositoryPort: Send + Sync {
    /// Create the top-level actor document
    async fn create_actor(&self, draft: CharacterDraft) -> Result<Actor, ActorStoreError>;

    async fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, ActorStoreError>;

    /// Create embedded items in one batch, keeping the ids they carry.
    /// Either every item is created or none is.
    async fn create_embedded_items(
        &self,
        id: ActorId,
        items: Vec<OwnedItem>,
    ) -> Result<Vec<OwnedItem>, ActorStoreError>;

    /// Add to the actor's currency
    async fn add_currency(&self, id: ActorId, currency: Currency) -> Result<Currency, ActorStoreError>;

    async fn set_favorites(&self, id: ActorId, favorites: Vec<Favorite>) -> Result<(), ActorStoreError>;

    /// Grant ownership of the actor to a user
    async fn set_owner(&self, id: ActorId, owner: &UserId) -> Result<(), ActorStoreError>;
}
