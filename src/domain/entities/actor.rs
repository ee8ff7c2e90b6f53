//! Character actor and the draft it is created from

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::OwnedItem;
use crate::domain::value_objects::{ActorId, Currency, FormSubmission, TokenConfig, UserId};

/// The six ability scores, keyed by their three-letter abbreviation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores(BTreeMap<String, i64>);

impl AbilityScores {
    pub const KEYS: [&'static str; 6] = ["str", "dex", "con", "int", "wis", "cha"];
    pub const DEFAULT_SCORE: i64 = 10;

    /// Read `abilities[<key>]` for each ability, defaulting missing scores
    pub fn from_form(form: &FormSubmission) -> Self {
        Self(
            Self::KEYS
                .iter()
                .map(|key| {
                    let score = form
                        .number(&format!("abilities[{key}]"))
                        .unwrap_or(Self::DEFAULT_SCORE);
                    (key.to_string(), score)
                })
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self(
            Self::KEYS
                .iter()
                .map(|key| (key.to_string(), Self::DEFAULT_SCORE))
                .collect(),
        )
    }
}

/// Free-text biography and physical description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biography(BTreeMap<String, String>);

impl Biography {
    pub const FIELDS: [&'static str; 15] = [
        "backstory",
        "appearance",
        "trait",
        "ideal",
        "bond",
        "flaw",
        "alignment",
        "age",
        "height",
        "weight",
        "eyes",
        "hair",
        "skin",
        "gender",
        "faith",
    ];

    pub fn from_form(form: &FormSubmission) -> Self {
        Self(
            Self::FIELDS
                .iter()
                .filter_map(|field| form.text(field).map(|value| (field.to_string(), value)))
                .collect(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

/// Entry in the actor's favorites list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sort: i64,
}

impl Favorite {
    pub fn item(item_id: &str) -> Self {
        Self {
            id: format!(".Item.{item_id}"),
            kind: "item".to_string(),
            sort: 0,
        }
    }
}

/// Everything needed to create the actor document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDraft {
    pub name: String,
    pub img: Option<String>,
    pub token: TokenConfig,
    pub abilities: AbilityScores,
    pub details: Biography,
}

/// A persisted character actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub img: Option<String>,
    pub owner: Option<UserId>,
    pub token: TokenConfig,
    pub abilities: AbilityScores,
    pub details: Biography,
    pub items: Vec<OwnedItem>,
    pub currency: Currency,
    pub favorites: Vec<Favorite>,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    pub fn from_draft(draft: CharacterDraft) -> Self {
        Self {
            id: ActorId::new(),
            name: draft.name,
            img: draft.img,
            owner: None,
            token: draft.token,
            abilities: draft.abilities,
            details: draft.details,
            items: Vec::new(),
            currency: Currency::default(),
            favorites: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
