use std::sync::Arc;
use tokio::sync::RwLock;
use crate::application::ports::outbound::{SettingsRepositoryPort, SettingsError};
use crate::domain::value_objects::{validate_ordering, MancerSettings};

pub struct SettingsService {
    repository: Arc<dyn SettingsRepositoryPort>,
    cache: RwLock<Option<MancerSettings>>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepositoryPort>) -> Self {
        Self {
            repository,
            cache: RwLock::new(None),
        }
    }

    /// Get current settings (cached). Store errors fall back to env/defaults.
    pub async fn get(&self) -> MancerSettings {
        match self.try_get().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings, using defaults: {}", e);
                MancerSettings::from_env()
            }
        }
    }

    /// Get current settings (cached), surfacing store errors
    pub async fn try_get(&self) -> Result<MancerSettings, SettingsError> {
        let cache = self.cache.read().await;
        if let Some(settings) = &*cache {
            return Ok(settings.clone());
        }
        drop(cache);

        let settings = self.repository.get().await?;
        *self.cache.write().await = Some(settings.clone());
        Ok(settings)
    }

    /// Update settings and refresh cache
    pub async fn update(&self, settings: MancerSettings) -> Result<(), SettingsError> {
        validate_ordering(&settings.advancement_order)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;
        self.repository.save(&settings).await?;
        *self.cache.write().await = Some(settings);
        Ok(())
    }

    /// Reset to env/defaults and clear DB values
    pub async fn reset(&self) -> Result<MancerSettings, SettingsError> {
        let settings = self.repository.reset().await?;
        *self.cache.write().await = Some(settings.clone());
        Ok(settings)
    }
}
