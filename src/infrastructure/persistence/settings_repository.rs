use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use tracing::warn;

use crate::application::ports::outbound::{SettingsError, SettingsRepositoryPort};
use crate::domain::value_objects::{validate_ordering, MancerSettings};

pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS mancer_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
        "#).execute(&pool).await?;

        Ok(Self { pool })
    }
}

/// Parse a stored value, keeping the current one if the row is corrupt
fn parse_into<T: std::str::FromStr>(key: &str, value: &str, target: &mut T) {
    match value.parse() {
        Ok(v) => *target = v,
        Err(_) => warn!(key, value, "Ignoring malformed setting"),
    }
}

fn json_into<T: DeserializeOwned>(key: &str, value: &str, target: &mut T) {
    match serde_json::from_str(value) {
        Ok(v) => *target = v,
        Err(e) => warn!(key, error = %e, "Ignoring malformed setting"),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, SettingsError> {
    serde_json::to_string(value).map_err(|e| SettingsError::Serialization(e.to_string()))
}

#[async_trait]
impl SettingsRepositoryPort for SqliteSettingsRepository {
    async fn get(&self) -> Result<MancerSettings, SettingsError> {
        let mut settings = MancerSettings::from_env(); // Start with env defaults

        // Override with DB values
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM mancer_settings")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        for (key, value) in rows {
            match key.as_str() {
                "advancement_order" => json_into(&key, &value, &mut settings.advancement_order),
                "mandatory_fields" => json_into(&key, &value, &mut settings.mandatory_fields),
                "enable_starting_wealth" => parse_into(&key, &value, &mut settings.enable_starting_wealth),
                "workflow_construct_timeout_ms" => parse_into(&key, &value, &mut settings.workflow_construct_timeout_ms),
                "workflow_completion_timeout_ms" => parse_into(&key, &value, &mut settings.workflow_completion_timeout_ms),
                "workflow_max_attempts" => parse_into(&key, &value, &mut settings.workflow_max_attempts),
                "workflow_settle_delay_ms" => parse_into(&key, &value, &mut settings.workflow_settle_delay_ms),
                "enable_token_customization" => parse_into(&key, &value, &mut settings.enable_token_customization),
                "publish_chat_summary" => parse_into(&key, &value, &mut settings.publish_chat_summary),
                _ => {}
            }
        }

        if let Err(e) = validate_ordering(&settings.advancement_order) {
            warn!(error = %e, "Stored advancement order is invalid, using default");
            settings.advancement_order = MancerSettings::default().advancement_order;
        }

        Ok(settings)
    }

    async fn save(&self, settings: &MancerSettings) -> Result<(), SettingsError> {
        let pairs = [
            ("advancement_order", to_json(&settings.advancement_order)?),
            ("mandatory_fields", to_json(&settings.mandatory_fields)?),
            ("enable_starting_wealth", settings.enable_starting_wealth.to_string()),
            ("workflow_construct_timeout_ms", settings.workflow_construct_timeout_ms.to_string()),
            ("workflow_completion_timeout_ms", settings.workflow_completion_timeout_ms.to_string()),
            ("workflow_max_attempts", settings.workflow_max_attempts.to_string()),
            ("workflow_settle_delay_ms", settings.workflow_settle_delay_ms.to_string()),
            ("enable_token_customization", settings.enable_token_customization.to_string()),
            ("publish_chat_summary", settings.publish_chat_summary.to_string()),
        ];

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;
        for (key, value) in pairs {
            sqlx::query("INSERT OR REPLACE INTO mancer_settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(|e| SettingsError::Database(e.to_string()))?;
        }
        tx.commit()
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(())
    }

    async fn reset(&self) -> Result<MancerSettings, SettingsError> {
        sqlx::query("DELETE FROM mancer_settings")
            .execute(&self.pool)
            .await
            .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(MancerSettings::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{OrderingEntry, SelectionKind};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn repository() -> SqliteSettingsRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteSettingsRepository::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let repository = repository().await;
        let mut settings = MancerSettings::default();
        settings.advancement_order = vec![
            OrderingEntry::new(SelectionKind::Class, 1),
            OrderingEntry::new(SelectionKind::Race, 2),
            OrderingEntry::new(SelectionKind::Background, 3),
        ];
        settings.workflow_max_attempts = 5;

        repository.save(&settings).await.unwrap();

        assert_eq!(repository.get().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back_per_key() {
        let repository = repository().await;
        sqlx::query("INSERT INTO mancer_settings (key, value) VALUES ('workflow_max_attempts', 'many'), ('advancement_order', '[1,2]'), ('publish_chat_summary', 'false')")
            .execute(&repository.pool)
            .await
            .unwrap();

        let settings = repository.get().await.unwrap();

        assert_eq!(settings.workflow_max_attempts, 3);
        assert_eq!(settings.advancement_order, MancerSettings::default().advancement_order);
        assert!(!settings.publish_chat_summary);
    }

    #[tokio::test]
    async fn test_reset_clears_rows() {
        let repository = repository().await;
        let settings = MancerSettings {
            enable_starting_wealth: false,
            ..MancerSettings::default()
        };
        repository.save(&settings).await.unwrap();

        repository.reset().await.unwrap();

        assert!(repository.get().await.unwrap().enable_starting_wealth);
    }
}
