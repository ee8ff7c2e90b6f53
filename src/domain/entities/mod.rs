//! Domain entities - Core business objects with identity

mod actor;
mod equipment;
mod item;
mod submission;
mod user;

pub use actor::{AbilityScores, Actor, Biography, CharacterDraft, Favorite};
pub use equipment::{EquipmentSelection, FULL_ITEM_MIN_SYSTEM_KEYS};
pub use item::{AdvancementKind, AdvancementStep, OwnedItem, TemplateItem};
pub use submission::PendingSubmission;
pub use user::{UserInfo, UserRole};
