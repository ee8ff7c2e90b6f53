//! Host users as seen by character creation

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::UserId;

/// Host permission tiers, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Player,
    Trusted,
    Assistant,
    Gamemaster,
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "player" => Ok(UserRole::Player),
            "trusted" => Ok(UserRole::Trusted),
            "assistant" => Ok(UserRole::Assistant),
            "gamemaster" | "gm" => Ok(UserRole::Gamemaster),
            other => Err(format!("Unknown user role: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
    /// Explicit actor-creation grant for roles below assistant
    #[serde(default)]
    pub actor_create_granted: bool,
}

impl UserInfo {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            actor_create_granted: false,
        }
    }

    pub fn is_gm(&self) -> bool {
        self.role >= UserRole::Assistant
    }

    pub fn can_create_actor(&self) -> bool {
        self.is_gm() || self.actor_create_granted
    }
}
