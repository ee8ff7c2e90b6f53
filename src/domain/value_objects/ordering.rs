//! Advancement ordering policy
//!
//! A configurable list deciding in which sequence the background, race and
//! class templates are advanced onto a new character.

use serde::{Deserialize, Serialize};

use super::SelectionKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingEntry {
    pub id: SelectionKind,
    pub label: String,
    pub order: i32,
    #[serde(default = "default_sortable")]
    pub sortable: bool,
}

fn default_sortable() -> bool {
    true
}

impl OrderingEntry {
    pub fn new(id: SelectionKind, order: i32) -> Self {
        Self {
            id,
            label: id.label().to_string(),
            order,
            sortable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    #[error("Expected {expected} ordering entries, found {found}")]
    WrongLength { expected: usize, found: usize },
    #[error("Ordering entry for {0} appears more than once")]
    Duplicate(SelectionKind),
    #[error("Ordering has no entry for {0}")]
    Missing(SelectionKind),
}

/// `[background:10, race:20, class:30]`
pub fn default_ordering() -> Vec<OrderingEntry> {
    vec![
        OrderingEntry::new(SelectionKind::Background, 10),
        OrderingEntry::new(SelectionKind::Race, 20),
        OrderingEntry::new(SelectionKind::Class, 30),
    ]
}

/// Check that an ordering names every required kind exactly once
pub fn validate_ordering(entries: &[OrderingEntry]) -> Result<(), OrderingError> {
    if entries.len() != SelectionKind::ALL.len() {
        return Err(OrderingError::WrongLength {
            expected: SelectionKind::ALL.len(),
            found: entries.len(),
        });
    }
    for (index, entry) in entries.iter().enumerate() {
        if entries[..index].iter().any(|e| e.id == entry.id) {
            return Err(OrderingError::Duplicate(entry.id));
        }
    }
    match SelectionKind::ALL
        .into_iter()
        .find(|kind| !entries.iter().any(|e| e.id == *kind))
    {
        Some(kind) => Err(OrderingError::Missing(kind)),
        None => Ok(()),
    }
}

/// Order the present templates by ascending `order`, ties kept in list position.
///
/// If a present kind has no entry in `entries`, the literal sequence
/// `[background, race, class]` is used instead.
pub fn apply_ordering<T>(
    entries: &[OrderingEntry],
    background: Option<T>,
    race: Option<T>,
    class: Option<T>,
) -> Vec<T> {
    let mut slots = [
        (SelectionKind::Background, background),
        (SelectionKind::Race, race),
        (SelectionKind::Class, class),
    ];

    let covered = slots
        .iter()
        .filter(|(_, item)| item.is_some())
        .all(|(kind, _)| entries.iter().any(|e| e.id == *kind));

    if !covered {
        return fallback_sequence(slots);
    }

    let mut present: Vec<&OrderingEntry> = entries
        .iter()
        .filter(|e| slots.iter().any(|(kind, item)| *kind == e.id && item.is_some()))
        .collect();
    // sort_by_key is stable, so equal `order` values keep list position
    present.sort_by_key(|e| e.order);

    let mut ordered = Vec::with_capacity(present.len());
    for entry in present {
        if let Some(slot) = slots.iter_mut().find(|(kind, _)| *kind == entry.id) {
            if let Some(item) = slot.1.take() {
                ordered.push(item);
            }
        }
    }
    ordered
}

/// `[background, race, class]`, skipping absent kinds
pub fn fallback_sequence<T>(slots: [(SelectionKind, Option<T>); 3]) -> Vec<T> {
    slots.into_iter().filter_map(|(_, item)| item).collect()
}
