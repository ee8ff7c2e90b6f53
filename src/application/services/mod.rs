//! Application services - Use case implementations
//!
//! Each service depends only on outbound ports and domain types. The
//! character creation service coordinates the others; the approval service
//! holds the cross-session protocol state.

pub mod advancement_service;
pub mod approval_service;
pub mod character_creation_service;
pub mod compendium_resolver;
pub mod equipment_service;
pub mod ordering_service;
pub mod settings_service;
pub mod wealth_service;

pub use advancement_service::{
    AdvancementAttempt, AdvancementError, AdvancementOrchestrator, AdvancementPolicy,
    AdvancementReport, AdvancementRun, AdvancementStatus,
};
pub use approval_service::{ApprovalAction, ApprovalError, ApprovalService};
pub use character_creation_service::{
    CharacterCreationService, CreatedCharacter, CreationError, CreationPorts, SubmissionOutcome,
};
pub use compendium_resolver::{CompendiumResolver, ResolveError, ResolvedTemplates};
pub use equipment_service::{merge_sources, EquipmentAssembler, EquipmentError, PreparedEquipment};
pub use ordering_service::OrderingPolicy;
pub use settings_service::SettingsService;
pub use wealth_service::{total_wealth, WealthResolution, WealthResolver};
