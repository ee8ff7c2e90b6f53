//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: template and owned items, actors, users, pending submissions
//! - Value Objects: selections, currency, ordering, settings, token config
//! - Domain Services: validation pass, wealth formulas, favorites, summaries

pub mod entities;
pub mod services;
pub mod value_objects;
