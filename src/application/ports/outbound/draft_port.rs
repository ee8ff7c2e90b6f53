//! Draft port - Per-user storage of an in-progress creation form

use async_trait::async_trait;

use crate::application::ports::outbound::SettingsError;
use crate::domain::value_objects::{FormSubmission, UserId};

#[async_trait]
pub trait DraftRepositoryPort: Send + Sync {
    async fn save(&self, user: &UserId, form: &FormSubmission) -> Result<(), SettingsError>;
    async fn load(&self, user: &UserId) -> Result<Option<FormSubmission>, SettingsError>;
    async fn clear(&self, user: &UserId) -> Result<(), SettingsError>;
}
