//! Post-advancement validation of a character's race, background and class
//!
//! The pass classifies, it never mutates: a missing required item is an
//! error, duplicates and name mismatches are warnings.

use serde::{Deserialize, Serialize};

use crate::domain::entities::OwnedItem;
use crate::domain::value_objects::SelectionKind;

/// Template names the character is expected to end up with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedTemplates {
    pub race: String,
    pub background: String,
    pub class: String,
}

impl ExpectedTemplates {
    pub fn name(&self, kind: SelectionKind) -> &str {
        match kind {
            SelectionKind::Race => &self.race,
            SelectionKind::Background => &self.background,
            SelectionKind::Class => &self.class,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum ValidationIssue {
    /// No item of a required kind is present
    MissingItem { kind: SelectionKind },
    /// More than one item of a kind is present
    MultipleItems { kind: SelectionKind, count: usize },
    /// The single item present is not the one that was selected
    ItemMismatch {
        kind: SelectionKind,
        expected: String,
        found: String,
    },
    /// The actor could not be read back for validation
    ActorUnavailable { reason: String },
}

impl ValidationIssue {
    /// Stable machine-readable code, e.g. `missing-race`
    pub fn code(&self) -> String {
        match self {
            ValidationIssue::MissingItem { kind } => format!("missing-{kind}"),
            ValidationIssue::MultipleItems { .. } => "multiple-items".to_string(),
            ValidationIssue::ItemMismatch { .. } => "item-mismatch".to_string(),
            ValidationIssue::ActorUnavailable { .. } => "actor-unavailable".to_string(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::MissingItem { kind } => {
                write!(f, "Character has no {} item", kind.as_str())
            }
            ValidationIssue::MultipleItems { kind, count } => {
                write!(f, "Character has {count} {} items", kind.as_str())
            }
            ValidationIssue::ItemMismatch {
                kind,
                expected,
                found,
            } => write!(
                f,
                "Expected {} '{expected}' but found '{found}'",
                kind.as_str()
            ),
            ValidationIssue::ActorUnavailable { reason } => {
                write!(f, "Could not validate character: {reason}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub success: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![ValidationIssue::ActorUnavailable {
                reason: reason.into(),
            }],
            warnings: Vec::new(),
        }
    }
}

pub fn validate_character(items: &[OwnedItem], expected: &ExpectedTemplates) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for kind in [SelectionKind::Race, SelectionKind::Background, SelectionKind::Class] {
        let matching: Vec<&OwnedItem> = items.iter().filter(|item| item.is_kind(kind)).collect();
        match matching.as_slice() {
            [] => errors.push(ValidationIssue::MissingItem { kind }),
            [only] => {
                if only.name != expected.name(kind) {
                    warnings.push(ValidationIssue::ItemMismatch {
                        kind,
                        expected: expected.name(kind).to_string(),
                        found: only.name.clone(),
                    });
                }
            }
            many => warnings.push(ValidationIssue::MultipleItems {
                kind,
                count: many.len(),
            }),
        }
    }

    ValidationReport {
        success: errors.is_empty(),
        errors,
        warnings,
    }
}
