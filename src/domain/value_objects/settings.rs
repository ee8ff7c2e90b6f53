//! Feature settings value object
//!
//! Settings are stored in SQLite as key/value pairs and exposed over the REST
//! API for the settings menu, so the JSON shape of this struct is the contract.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ordering::{default_ordering, OrderingEntry};

/// All configurable character-creation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MancerSettings {
    // Ordering
    pub advancement_order: Vec<OrderingEntry>,

    // Submission
    pub mandatory_fields: Vec<String>,

    // Wealth
    pub enable_starting_wealth: bool,

    // Advancement workflow
    pub workflow_construct_timeout_ms: u64,
    pub workflow_completion_timeout_ms: u64,
    pub workflow_max_attempts: u32,
    pub workflow_settle_delay_ms: u64,

    // Presentation
    pub enable_token_customization: bool,
    pub publish_chat_summary: bool,
}

impl Default for MancerSettings {
    fn default() -> Self {
        Self {
            advancement_order: default_ordering(),
            mandatory_fields: vec!["name".to_string()],
            enable_starting_wealth: true,
            workflow_construct_timeout_ms: 5_000,
            workflow_completion_timeout_ms: 300_000,
            workflow_max_attempts: 3,
            workflow_settle_delay_ms: 500,
            enable_token_customization: true,
            publish_chat_summary: true,
        }
    }
}

impl MancerSettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            advancement_order: env_json_or("HERO_MANCER_ADVANCEMENT_ORDER", defaults.advancement_order),
            mandatory_fields: env_json_or("HERO_MANCER_MANDATORY_FIELDS", defaults.mandatory_fields),
            enable_starting_wealth: env_or("HERO_MANCER_STARTING_WEALTH", defaults.enable_starting_wealth),
            workflow_construct_timeout_ms: env_or("HERO_MANCER_CONSTRUCT_TIMEOUT_MS", defaults.workflow_construct_timeout_ms),
            workflow_completion_timeout_ms: env_or("HERO_MANCER_COMPLETION_TIMEOUT_MS", defaults.workflow_completion_timeout_ms),
            workflow_max_attempts: env_or("HERO_MANCER_MAX_ATTEMPTS", defaults.workflow_max_attempts),
            workflow_settle_delay_ms: env_or("HERO_MANCER_SETTLE_DELAY_MS", defaults.workflow_settle_delay_ms),
            enable_token_customization: env_or("HERO_MANCER_TOKEN_CUSTOMIZATION", defaults.enable_token_customization),
            publish_chat_summary: env_or("HERO_MANCER_CHAT_SUMMARY", defaults.publish_chat_summary),
        }
    }

    pub fn construct_timeout(&self) -> Duration {
        Duration::from_millis(self.workflow_construct_timeout_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.workflow_completion_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.workflow_settle_delay_ms)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_json_or<T: serde::de::DeserializeOwned>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| serde_json::from_str(&v).ok())
        .unwrap_or(default)
}
