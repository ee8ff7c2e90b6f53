//! In-process actor store
//!
//! Holds the actors created during this process lifetime. The host keeps the
//! durable copy; this store is what advancement and validation read back.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::ports::outbound::{ActorRepositoryPort, ActorStoreError};
use crate::domain::entities::{Actor, CharacterDraft, Favorite, OwnedItem};
use crate::domain::value_objects::{ActorId, Currency, UserId};

#[derive(Default)]
pub struct InMemoryActorRepository {
    actors: RwLock<HashMap<ActorId, Actor>>,
}

impl InMemoryActorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn actor_count(&self) -> usize {
        self.actors.read().await.len()
    }
}

#[async_trait]
impl ActorRepositoryPort for InMemoryActorRepository {
    async fn create_actor(&self, draft: CharacterDraft) -> Result<Actor, ActorStoreError> {
        let actor = Actor::from_draft(draft);
        self.actors.write().await.insert(actor.id, actor.clone());
        debug!(actor_id = %actor.id, "Stored actor");
        Ok(actor)
    }

    async fn get_actor(&self, id: ActorId) -> Result<Option<Actor>, ActorStoreError> {
        Ok(self.actors.read().await.get(&id).cloned())
    }

    async fn create_embedded_items(
        &self,
        id: ActorId,
        items: Vec<OwnedItem>,
    ) -> Result<Vec<OwnedItem>, ActorStoreError> {
        let mut actors = self.actors.write().await;
        let actor = actors.get_mut(&id).ok_or(ActorStoreError::NotFound(id))?;

        // validate the whole batch before touching the actor
        for (index, item) in items.iter().enumerate() {
            let taken = actor.items.iter().any(|existing| existing.id == item.id)
                || items[..index].iter().any(|other| other.id == item.id);
            if taken {
                return Err(ActorStoreError::DuplicateItem(item.id.clone()));
            }
        }

        actor.items.extend(items.iter().cloned());
        Ok(items)
    }

    async fn add_currency(&self, id: ActorId, currency: Currency) -> Result<Currency, ActorStoreError> {
        let mut actors = self.actors.write().await;
        let actor = actors.get_mut(&id).ok_or(ActorStoreError::NotFound(id))?;
        actor.currency = actor
            .currency
            .checked_add(currency)
            .ok_or(ActorStoreError::CurrencyOverflow(id))?;
        Ok(actor.currency)
    }

    async fn set_favorites(&self, id: ActorId, favorites: Vec<Favorite>) -> Result<(), ActorStoreError> {
        let mut actors = self.actors.write().await;
        let actor = actors.get_mut(&id).ok_or(ActorStoreError::NotFound(id))?;
        actor.favorites = favorites;
        Ok(())
    }

    async fn set_owner(&self, id: ActorId, owner: &UserId) -> Result<(), ActorStoreError> {
        let mut actors = self.actors.write().await;
        let actor = actors.get_mut(&id).ok_or(ActorStoreError::NotFound(id))?;
        actor.owner = Some(owner.clone());
        Ok(())
    }
}
