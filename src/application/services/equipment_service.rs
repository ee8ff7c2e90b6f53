//! Equipment Assembler - Starting equipment from background and class
//!
//! Selections are collected per source (none for a source that took starting
//! wealth), upgraded from lossy index data to full compendium documents,
//! merged across sources, and created on the actor in one batch. Favorites
//! are matched back to created items by the compendium UUID each item carries.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::{
    ActorRepositoryPort, ActorStoreError, CompendiumPort, Notification, NotificationPort,
};
use crate::domain::entities::{EquipmentSelection, Favorite, OwnedItem, TemplateItem};
use crate::domain::services::merge_favorites;
use crate::domain::value_objects::{
    pack_from_uuid, ActorId, EquipmentSource, FormSubmission, PackId, UserId, WealthDecision,
};

#[derive(Debug, thiserror::Error)]
pub enum EquipmentError {
    #[error("Equipment item {0} could not be resolved")]
    Unresolved(String),
    #[error("Starting equipment could not be added: {0}")]
    Create(#[from] ActorStoreError),
    #[error("Favorites could not be saved: {0}")]
    Favorites(ActorStoreError),
}

/// An item ready to be created, with the favorite choice made for it
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedEquipment {
    pub item: OwnedItem,
    pub favorite: bool,
}

pub struct EquipmentAssembler {
    compendium: Arc<dyn CompendiumPort>,
    actors: Arc<dyn ActorRepositoryPort>,
    notifier: Arc<dyn NotificationPort>,
}

impl EquipmentAssembler {
    pub fn new(
        compendium: Arc<dyn CompendiumPort>,
        actors: Arc<dyn ActorRepositoryPort>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            compendium,
            actors,
            notifier,
        }
    }

    /// Equipment selections for one source. A source that uses starting
    /// wealth contributes nothing, whatever the form holds.
    pub fn collect(
        form: &FormSubmission,
        source: EquipmentSource,
        wealth: &WealthDecision,
    ) -> Vec<EquipmentSelection> {
        if wealth.use_wealth {
            debug!(%source, "Skipping equipment for source using starting wealth");
            return Vec::new();
        }
        form.equipment_entries(source)
            .iter()
            .filter_map(|entry| EquipmentSelection::from_form_entry(source, entry))
            .collect()
    }

    /// Turn selections into full items, fetching documents whose cached data
    /// is partial. Selections that cannot be resolved are skipped.
    #[instrument(skip(self, selections), fields(count = selections.len()))]
    pub async fn prepare(&self, selections: Vec<EquipmentSelection>) -> Vec<PreparedEquipment> {
        let mut prepared = Vec::with_capacity(selections.len());
        for selection in selections {
            let mut item = match self.full_item(&selection).await {
                Ok(item) => item,
                Err(e) => {
                    warn!(error = %e, "Skipping equipment selection");
                    continue;
                }
            };
            item.system
                .insert("quantity".to_string(), Value::from(selection.quantity));
            item.system
                .insert("equipped".to_string(), Value::Bool(selection.equipped));
            prepared.push(PreparedEquipment {
                item,
                favorite: selection.favorite,
            });
        }
        prepared
    }

    async fn full_item(&self, selection: &EquipmentSelection) -> Result<OwnedItem, EquipmentError> {
        let cached = || {
            selection
                .data
                .clone()
                .map(|item| with_source(item, &selection.uuid))
                .ok_or_else(|| EquipmentError::Unresolved(selection.uuid.clone()))
        };
        if !selection.needs_full_document() {
            return cached();
        }

        match self.fetch(selection).await {
            Some(template) => Ok(OwnedItem::from_template(&template)),
            None => {
                debug!(uuid = %selection.uuid, "Full document unavailable, using cached data");
                cached()
            }
        }
    }

    async fn fetch(&self, selection: &EquipmentSelection) -> Option<TemplateItem> {
        match self.compendium.get_document(&selection.uuid).await {
            Ok(Some(template)) => return Some(template),
            Ok(None) => {}
            Err(e) => warn!(uuid = %selection.uuid, error = %e, "Compendium fetch failed"),
        }

        let pack_id = selection
            .pack_id
            .clone()
            .or_else(|| pack_from_uuid(&selection.uuid).map(PackId::new))?;
        let item_id = selection
            .item_id
            .clone()
            .or_else(|| selection.data.as_ref().map(|d| d.id.clone()))?;
        match self.compendium.get_from_pack(&pack_id, &item_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(pack = %pack_id, error = %e, "Compendium pack lookup failed");
                None
            }
        }
    }

    /// Create the prepared items on the actor and record favorites.
    ///
    /// Never fails: a batch-creation error is reported to the user and yields
    /// an empty list so character creation can continue without equipment.
    #[instrument(skip(self, equipment), fields(actor_id = %actor_id, count = equipment.len()))]
    pub async fn assemble(
        &self,
        user: &UserId,
        actor_id: ActorId,
        equipment: Vec<PreparedEquipment>,
    ) -> Vec<OwnedItem> {
        if equipment.is_empty() {
            return Vec::new();
        }

        let favorite_sources: HashSet<String> = equipment
            .iter()
            .filter(|e| e.favorite)
            .filter_map(|e| e.item.source_uuid.clone())
            .collect();
        let items: Vec<OwnedItem> = equipment.into_iter().map(|e| e.item).collect();

        let created = match self.create(actor_id, items).await {
            Ok(created) => created,
            Err(e) => {
                warn!(error = %e, "Failed to create starting equipment");
                self.notifier
                    .notify(
                        user,
                        Notification::warning(e.to_string()).with_code("equipment-failed"),
                    )
                    .await;
                return Vec::new();
            }
        };

        if !favorite_sources.is_empty() {
            if let Err(e) = self
                .apply_favorites(actor_id, &created, &favorite_sources)
                .await
            {
                warn!(error = %e, "Failed to apply favorites");
                self.notifier
                    .notify(
                        user,
                        Notification::warning(e.to_string()).with_code("favorites-failed"),
                    )
                    .await;
            }
        }

        info!(count = created.len(), "Created starting equipment");
        created
    }

    async fn create(
        &self,
        actor_id: ActorId,
        items: Vec<OwnedItem>,
    ) -> Result<Vec<OwnedItem>, EquipmentError> {
        Ok(self.actors.create_embedded_items(actor_id, items).await?)
    }

    async fn apply_favorites(
        &self,
        actor_id: ActorId,
        created: &[OwnedItem],
        favorite_sources: &HashSet<String>,
    ) -> Result<(), EquipmentError> {
        let incoming: Vec<Favorite> = created
            .iter()
            .filter(|item| {
                item.source_uuid
                    .as_ref()
                    .is_some_and(|uuid| favorite_sources.contains(uuid))
            })
            .map(|item| Favorite::item(item.id.as_str()))
            .collect();

        let existing = self
            .actors
            .get_actor(actor_id)
            .await
            .map_err(EquipmentError::Favorites)?
            .map(|actor| actor.favorites)
            .unwrap_or_default();
        self.actors
            .set_favorites(actor_id, merge_favorites(&existing, incoming))
            .await
            .map_err(EquipmentError::Favorites)
    }
}

fn with_source(mut item: OwnedItem, uuid: &str) -> OwnedItem {
    if item.source_uuid.is_none() {
        item.source_uuid = Some(uuid.to_string());
    }
    item
}

/// Combine both sources' equipment. The same compendium item chosen twice is
/// created once with the quantities added, since created items keep their
/// template id.
pub fn merge_sources(
    background: Vec<PreparedEquipment>,
    class: Vec<PreparedEquipment>,
) -> Vec<PreparedEquipment> {
    let mut merged: Vec<PreparedEquipment> = Vec::new();
    for entry in background.into_iter().chain(class) {
        let existing = merged.iter_mut().find(|m| m.item.id == entry.item.id);
        match existing {
            Some(existing) => {
                let quantity = existing.item.quantity().saturating_add(entry.item.quantity());
                let equipped = existing.item.system.get("equipped").and_then(Value::as_bool)
                    == Some(true)
                    || entry.item.system.get("equipped").and_then(Value::as_bool) == Some(true);
                existing
                    .item
                    .system
                    .insert("quantity".to_string(), Value::from(quantity));
                existing
                    .item
                    .system
                    .insert("equipped".to_string(), Value::Bool(equipped));
                existing.favorite |= entry.favorite;
            }
            None => merged.push(entry),
        }
    }
    merged
}
