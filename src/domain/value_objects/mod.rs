//! Value objects - Immutable objects defined by their attributes

mod currency;
mod form;
mod ids;
mod ordering;
mod selection;
mod settings;
mod token;

pub use currency::{Currency, Denomination, EquipmentSource, WealthDecision};
pub use form::FormSubmission;
pub use ids::*;
pub use ordering::{
    apply_ordering, default_ordering, fallback_sequence, validate_ordering, OrderingEntry,
    OrderingError,
};
pub use selection::{pack_from_uuid, Selection, SelectionKind, SelectionParseError, SelectionSet};
pub use settings::MancerSettings;
pub use token::{ring_effects, TokenConfig, TokenDisplayMode, TokenRing};
