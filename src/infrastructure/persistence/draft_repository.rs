use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::application::ports::outbound::{DraftRepositoryPort, SettingsError};
use crate::domain::value_objects::{FormSubmission, UserId};

/// One saved creation form per user, stored as JSON
pub struct SqliteDraftRepository {
    pool: SqlitePool,
}

impl SqliteDraftRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS character_drafts (
                user_id TEXT PRIMARY KEY,
                form TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DraftRepositoryPort for SqliteDraftRepository {
    async fn save(&self, user: &UserId, form: &FormSubmission) -> Result<(), SettingsError> {
        let json = serde_json::to_string(form).map_err(|e| SettingsError::Serialization(e.to_string()))?;
        sqlx::query("INSERT OR REPLACE INTO character_drafts (user_id, form, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)")
            .bind(user.as_str())
            .bind(json)
            .execute(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        Ok(())
    }

    async fn load(&self, user: &UserId) -> Result<Option<FormSubmission>, SettingsError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT form FROM character_drafts WHERE user_id = ?")
            .bind(user.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        row.map(|(json,)| serde_json::from_str(&json).map_err(|e| SettingsError::Serialization(e.to_string())))
            .transpose()
    }

    async fn clear(&self, user: &UserId) -> Result<(), SettingsError> {
        sqlx::query("DELETE FROM character_drafts WHERE user_id = ?")
            .bind(user.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        Ok(())
    }
}
