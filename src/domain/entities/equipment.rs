//! Starting-equipment line items chosen on the equipment tab

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::OwnedItem;
use crate::domain::value_objects::{EquipmentSource, ItemId, PackId};

/// Below this many system-data keys, cached item data is treated as an index
/// summary rather than the full document
pub const FULL_ITEM_MIN_SYSTEM_KEYS: usize = 5;

/// One piece of equipment selected for a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSelection {
    pub source: EquipmentSource,
    pub uuid: String,
    #[serde(default)]
    pub pack_id: Option<PackId>,
    #[serde(default)]
    pub item_id: Option<ItemId>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub equipped: bool,
    #[serde(default)]
    pub favorite: bool,
    /// Item data cached by the form; may be a lossy index entry
    #[serde(default)]
    pub data: Option<OwnedItem>,
}

fn default_quantity() -> u32 {
    1
}

impl EquipmentSelection {
    /// Parse a form equipment entry; entries without a UUID are ignored
    pub fn from_form_entry(source: EquipmentSource, entry: &Value) -> Option<Self> {
        let mut entry = entry.as_object()?.clone();
        entry.insert("source".to_string(), Value::String(source.as_str().to_string()));
        let selection: Self = serde_json::from_value(Value::Object(entry)).ok()?;
        (!selection.uuid.trim().is_empty()).then_some(selection)
    }

    /// Cached data is partial when missing, when it carries too few system
    /// keys, or when it lacks nested activities
    pub fn needs_full_document(&self) -> bool {
        match &self.data {
            None => true,
            Some(item) => {
                item.system.len() < FULL_ITEM_MIN_SYSTEM_KEYS
                    || !item.system.contains_key("activities")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_form_entry_defaults() {
        let entry = json!({"uuid": "Compendium.dnd5e.items.Item.dagger", "equipped": true});
        let selection = EquipmentSelection::from_form_entry(EquipmentSource::Class, &entry).unwrap();
        assert_eq!(selection.source, EquipmentSource::Class);
        assert_eq!(selection.quantity, 1);
        assert!(selection.equipped);
        assert!(!selection.favorite);
        assert!(selection.needs_full_document());
    }

    #[test]
    fn test_blank_uuid_is_ignored() {
        let entry = json!({"uuid": "  "});
        assert!(EquipmentSelection::from_form_entry(EquipmentSource::Background, &entry).is_none());
    }

    #[test]
    fn test_full_data_is_not_refetched() {
        let entry = json!({
            "uuid": "Compendium.dnd5e.items.Item.dagger",
            "data": {
                "_id": "dagger",
                "name": "Dagger",
                "type": "weapon",
                "system": {
                    "quantity": 1, "weight": 1, "price": 2, "damage": {},
                    "properties": [], "activities": {}
                }
            }
        });
        let selection = EquipmentSelection::from_form_entry(EquipmentSource::Class, &entry).unwrap();
        assert!(!selection.needs_full_document());
    }
}
