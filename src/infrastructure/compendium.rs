//! JSON-file compendium adapter
//!
//! Every `<pack-id>.json` file in the compendium directory holds an array of
//! item documents for that pack, e.g. `dnd5e.classes.json`. Packs are loaded
//! once at startup and served read-only.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::application::ports::outbound::{CompendiumError, CompendiumPort};
use crate::domain::entities::TemplateItem;
use crate::domain::value_objects::{ItemId, PackId};

pub struct JsonCompendium {
    /// pack id -> item id -> document
    packs: HashMap<PackId, HashMap<ItemId, TemplateItem>>,
}

impl JsonCompendium {
    pub async fn load(dir: &Path) -> Result<Self, CompendiumError> {
        let unavailable = |e: std::io::Error| CompendiumError::Unavailable(format!("{}: {e}", dir.display()));

        let mut packs = HashMap::new();
        let mut entries = tokio::fs::read_dir(dir).await.map_err(unavailable)?;
        while let Some(entry) = entries.next_entry().await.map_err(unavailable)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(pack_id) = path.file_stem().and_then(|s| s.to_str()).map(PackId::new) else {
                continue;
            };

            let raw = tokio::fs::read_to_string(&path).await.map_err(unavailable)?;
            let documents: Vec<TemplateItem> = match serde_json::from_str(&raw) {
                Ok(documents) => documents,
                Err(e) => {
                    warn!(pack = %pack_id, error = %e, "Skipping unreadable compendium pack");
                    continue;
                }
            };

            debug!(pack = %pack_id, count = documents.len(), "Loaded compendium pack");
            packs.insert(pack_id.clone(), index_pack(&pack_id, documents));
        }

        info!(packs = packs.len(), "Compendium loaded");
        Ok(Self { packs })
    }

    #[cfg(test)]
    pub fn from_documents(packs: impl IntoIterator<Item = (PackId, Vec<TemplateItem>)>) -> Self {
        Self {
            packs: packs
                .into_iter()
                .map(|(pack_id, documents)| {
                    let index = index_pack(&pack_id, documents);
                    (pack_id, index)
                })
                .collect(),
        }
    }
}

fn index_pack(pack_id: &PackId, documents: Vec<TemplateItem>) -> HashMap<ItemId, TemplateItem> {
    documents
        .into_iter()
        .map(|mut document| {
            document.pack_id = Some(pack_id.clone());
            document.uuid = format!("Compendium.{}.Item.{}", pack_id, document.id);
            (document.id.clone(), document)
        })
        .collect()
}

/// Split `Compendium.<scope>.<pack>.Item.<id>` into pack and item id
fn parse_uuid(uuid: &str) -> Option<(PackId, ItemId)> {
    let parts: Vec<&str> = uuid.split('.').collect();
    match parts.as_slice() {
        ["Compendium", scope, pack, "Item", id] if !id.is_empty() => {
            Some((PackId::new(format!("{scope}.{pack}")), ItemId::new(*id)))
        }
        _ => None,
    }
}

#[async_trait]
impl CompendiumPort for JsonCompendium {
    async fn get_document(&self, uuid: &str) -> Result<Option<TemplateItem>, CompendiumError> {
        let (pack_id, item_id) =
            parse_uuid(uuid).ok_or_else(|| CompendiumError::InvalidUuid(uuid.to_string()))?;
        self.get_from_pack(&pack_id, &item_id).await
    }

    async fn get_from_pack(
        &self,
        pack_id: &PackId,
        item_id: &ItemId,
    ) -> Result<Option<TemplateItem>, CompendiumError> {
        let Some(pack) = self.packs.get(pack_id) else {
            debug!(pack = %pack_id, "No such compendium pack");
            return Ok(None);
        };
        Ok(pack.get(item_id).cloned())
    }
}
