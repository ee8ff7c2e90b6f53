//! Prototype token configuration for a new character

use serde::{Deserialize, Serialize};

use super::FormSubmission;

/// Dynamic token ring effect bits
pub mod ring_effects {
    pub const ENABLED: u32 = 0x01;
    pub const RING_PULSE: u32 = 0x02;
    pub const RING_GRADIENT: u32 = 0x04;
    pub const BKG_WAVE: u32 = 0x08;
    pub const INVISIBILITY: u32 = 0x10;

    pub fn from_name(name: &str) -> Option<u32> {
        match name {
            "RING_PULSE" => Some(RING_PULSE),
            "RING_GRADIENT" => Some(RING_GRADIENT),
            "BKG_WAVE" => Some(BKG_WAVE),
            "INVISIBILITY" => Some(INVISIBILITY),
            _ => None,
        }
    }
}

/// When a token shows its name or resource bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenDisplayMode {
    None,
    Control,
    OwnerHover,
    Hover,
    Owner,
    Always,
}

impl TokenDisplayMode {
    /// Host numeric encoding (0, 10, 20, 30, 40, 50)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            10 => Some(Self::Control),
            20 => Some(Self::OwnerHover),
            30 => Some(Self::Hover),
            40 => Some(Self::Owner),
            50 => Some(Self::Always),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRing {
    pub enabled: bool,
    pub ring_color: Option<String>,
    pub background_color: Option<String>,
    /// Bitwise combination of [`ring_effects`]
    pub effects: u32,
    pub subject_scale: f64,
}

impl Default for TokenRing {
    fn default() -> Self {
        Self {
            enabled: false,
            ring_color: None,
            background_color: None,
            effects: ring_effects::ENABLED,
            subject_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub texture: Option<String>,
    pub display_name: TokenDisplayMode,
    pub display_bars: TokenDisplayMode,
    pub actor_link: bool,
    pub vision: bool,
    pub ring: TokenRing,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            texture: None,
            display_name: TokenDisplayMode::OwnerHover,
            display_bars: TokenDisplayMode::OwnerHover,
            actor_link: true,
            vision: true,
            ring: TokenRing::default(),
        }
    }
}

impl TokenConfig {
    /// Build the token from form fields. With customization disabled only the
    /// texture is taken from the form.
    pub fn from_form(form: &FormSubmission, customize: bool) -> Self {
        let texture = form.text("token-art").or_else(|| form.text("character-art"));
        let defaults = Self {
            texture,
            ..Self::default()
        };
        if !customize {
            return defaults;
        }

        let display_name = form
            .number("displayName")
            .and_then(TokenDisplayMode::from_code)
            .unwrap_or(defaults.display_name);
        let display_bars = form
            .number("displayBars")
            .and_then(TokenDisplayMode::from_code)
            .unwrap_or(defaults.display_bars);
        let vision = match form.get("sight.enabled") {
            Some(_) => form.flag("sight.enabled"),
            None => defaults.vision,
        };

        let enabled = form.flag("ring.enabled");
        let effects = form
            .array("ring.effects")
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(ring_effects::from_name)
            .fold(ring_effects::ENABLED, |mask, bit| mask | bit);

        let ring = TokenRing {
            enabled,
            ring_color: form.text("ring.color"),
            background_color: form.text("backgroundColor"),
            effects,
            subject_scale: form
                .get("ring.subject.scale")
                .and_then(|v| v.as_f64().or_else(|| v.as_str()?.parse().ok()))
                .unwrap_or(1.0),
        };

        Self {
            display_name,
            display_bars,
            vision,
            ring,
            ..defaults
        }
    }
}
