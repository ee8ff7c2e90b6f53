//! Compendium port - Read-only access to template documents in compendium packs

use async_trait::async_trait;

use crate::domain::entities::TemplateItem;
use crate::domain::value_objects::{ItemId, PackId};

#[derive(Debug, thiserror::Error)]
pub enum CompendiumError {
    #[error("Malformed document UUID: {0}")]
    InvalidUuid(String),
    #[error("Compendium unavailable: {0}")]
    Unavailable(String),
}

/// Port for fetching compendium documents. A miss is `Ok(None)`.
#[async_trait]
pub trait CompendiumPort: Send + Sync {
    /// Fetch a document by its full UUID (`Compendium.<scope>.<pack>.Item.<id>`)
    async fn get_document(&self, uuid: &str) -> Result<Option<TemplateItem>, CompendiumError>;

    /// Fetch a document by pack and item id
    async fn get_from_pack(
        &self,
        pack_id: &PackId,
        item_id: &ItemId,
    ) -> Result<Option<TemplateItem>, CompendiumError>;
}
