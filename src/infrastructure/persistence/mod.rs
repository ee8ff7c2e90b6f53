//! Persistence adapters
//!
//! Settings and drafts live in SQLite; actors are held in process.

mod actor_repository;
mod draft_repository;
mod settings_repository;

pub use actor_repository::InMemoryActorRepository;
pub use draft_repository::SqliteDraftRepository;
pub use settings_repository::SqliteSettingsRepository;
