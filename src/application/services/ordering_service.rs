//! Ordering Policy - Decides the sequence templates are advanced in

use std::sync::Arc;

use tracing::warn;

use super::SettingsService;
use crate::domain::value_objects::{
    apply_ordering, default_ordering, fallback_sequence, validate_ordering, OrderingEntry,
    SelectionKind,
};

pub struct OrderingPolicy {
    settings: Arc<SettingsService>,
}

impl OrderingPolicy {
    pub fn new(settings: Arc<SettingsService>) -> Self {
        Self { settings }
    }

    /// The stored ordering, or the default when it is malformed
    pub async fn get_order(&self) -> Vec<OrderingEntry> {
        let order = self.settings.get().await.advancement_order;
        match validate_ordering(&order) {
            Ok(()) => order,
            Err(e) => {
                warn!(error = %e, "Stored advancement order is invalid, using default");
                default_ordering()
            }
        }
    }

    /// Order whichever templates are present. Never fails: if the policy
    /// cannot be read, the sequence is background, race, class.
    pub async fn apply_order<T>(
        &self,
        background: Option<T>,
        race: Option<T>,
        class: Option<T>,
    ) -> Vec<T> {
        match self.settings.try_get().await {
            Ok(settings) => match validate_ordering(&settings.advancement_order) {
                Ok(()) => apply_ordering(&settings.advancement_order, background, race, class),
                Err(e) => {
                    warn!(error = %e, "Stored advancement order is invalid, using default");
                    apply_ordering(&default_ordering(), background, race, class)
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to read advancement order, using literal sequence");
                fallback_sequence([
                    (SelectionKind::Background, background),
                    (SelectionKind::Race, race),
                    (SelectionKind::Class, class),
                ])
            }
        }
    }
}
