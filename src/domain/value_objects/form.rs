//! Submitted creation-form state
//!
//! The form framework hands over a flat key -> value map. Keys follow the
//! input names of the creation form (`name`, `race`, `abilities[str]`,
//! `use-starting-wealth-class`, ...). Values are whatever the input produced:
//! strings, numbers, booleans, or arrays for the equipment lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EquipmentSource, SelectionKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSubmission(BTreeMap<String, Value>);

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Trimmed, non-empty string value. Numbers are rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Checkbox-style value: `true`, `"on"`, `"true"`, or a non-zero number
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.as_str(), "on" | "true" | "1"),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            _ => false,
        }
    }

    pub fn number(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn array(&self, key: &str) -> &[Value] {
        match self.0.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// A field counts as filled when it holds a non-empty string, a number,
    /// `true`, or a non-empty array
    pub fn is_filled(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(_)) => true,
            Some(Value::Bool(b)) => *b,
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            _ => false,
        }
    }

    /// Mandatory fields that are missing or blank
    pub fn missing_fields<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|key| !self.is_filled(key))
            .map(String::as_str)
            .collect()
    }

    pub fn selection_token(&self, kind: SelectionKind) -> Option<String> {
        self.text(kind.as_str())
    }

    pub fn uses_starting_wealth(&self, source: EquipmentSource) -> bool {
        self.flag(&format!("use-starting-wealth-{}", source))
    }

    pub fn wealth_formula(&self, source: EquipmentSource) -> Option<String> {
        self.text(&format!("starting-wealth-formula-{}", source))
    }

    pub fn equipment_entries(&self, source: EquipmentSource) -> &[Value] {
        self.array(&format!("equipment-{}", source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flag_accepts_checkbox_values() {
        let form = FormSubmission::new()
            .with("a", true)
            .with("b", "on")
            .with("c", 0)
            .with("d", "off");
        assert!(form.flag("a"));
        assert!(form.flag("b"));
        assert!(!form.flag("c"));
        assert!(!form.flag("d"));
        assert!(!form.flag("missing"));
    }

    #[test]
    fn test_missing_fields() {
        let form = FormSubmission::new()
            .with("name", "  ")
            .with("race", "elf01")
            .with("equipment-class", json!([]));
        let required = vec![
            "name".to_string(),
            "race".to_string(),
            "equipment-class".to_string(),
        ];
        assert_eq!(form.missing_fields(&required), vec!["name", "equipment-class"]);
    }

    #[test]
    fn test_deserializes_from_flat_object() {
        let form: FormSubmission =
            serde_json::from_value(json!({"name": "Ilsa", "abilities[str]": "14"})).unwrap();
        assert_eq!(form.text("name").as_deref(), Some("Ilsa"));
        assert_eq!(form.number("abilities[str]"), Some(14));
    }
}
