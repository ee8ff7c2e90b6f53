//! Item documents: compendium templates and items embedded on an actor

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::value_objects::{ItemId, PackId, SelectionKind};

/// Known advancement step kinds. Steps are opaque to this engine beyond their
/// presence; unrecognised kinds deserialize as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvancementKind {
    AbilityScoreImprovement,
    HitPoints,
    ItemChoice,
    ItemGrant,
    ScaleValue,
    Size,
    Subclass,
    Trait,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementStep {
    #[serde(rename = "type")]
    pub kind: AdvancementKind,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub configuration: Value,
}

/// An immutable item document fetched from a compendium pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub img: Option<String>,
    /// Filled in by the compendium when the document is loaded from a pack
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub pack_id: Option<PackId>,
    #[serde(default)]
    pub advancement: Vec<AdvancementStep>,
    #[serde(default)]
    pub system: Map<String, Value>,
}

impl TemplateItem {
    pub fn has_advancement(&self) -> bool {
        !self.advancement.is_empty()
    }

    pub fn is_kind(&self, kind: SelectionKind) -> bool {
        self.item_type == kind.item_type()
    }
}

/// An item embedded on an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedItem {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub advancement: Vec<AdvancementStep>,
    #[serde(default)]
    pub system: Map<String, Value>,
    /// Compendium provenance: UUID of the template this item was copied from
    #[serde(default)]
    pub source_uuid: Option<String>,
}

impl OwnedItem {
    /// Deep-copy a template and stamp it with its compendium provenance.
    /// The template id is kept so created items can be traced back.
    pub fn from_template(template: &TemplateItem) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            item_type: template.item_type.clone(),
            img: template.img.clone(),
            advancement: template.advancement.clone(),
            system: template.system.clone(),
            source_uuid: (!template.uuid.is_empty()).then(|| template.uuid.clone()),
        }
    }

    pub fn is_kind(&self, kind: SelectionKind) -> bool {
        self.item_type == kind.item_type()
    }

    pub fn quantity(&self) -> u32 {
        self.system
            .get("quantity")
            .and_then(Value::as_u64)
            .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
            .unwrap_or(1)
    }
}
