//! Domain services - Pure business rules that do not belong to a single entity

pub mod dice;
pub mod favorites;
pub mod summary;
pub mod validation;

pub use dice::{roll_wealth, FormulaError};
pub use favorites::merge_favorites;
pub use summary::character_summary;
pub use validation::{validate_character, ExpectedTemplates, ValidationIssue, ValidationReport};
