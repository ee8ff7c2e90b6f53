//! Shared application state

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::application::ports::outbound::CompendiumPort;
use crate::application::services::{
    ApprovalService, CharacterCreationService, CreationPorts, OrderingPolicy, SettingsService,
};
use crate::infrastructure::compendium::JsonCompendium;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::{
    InMemoryActorRepository, SqliteDraftRepository, SqliteSettingsRepository,
};
use crate::infrastructure::session_adapter::SessionManagerAdapter;

/// Shared application state
pub struct AppState {
    /// Connected clients; also the host-facing ports
    pub sessions: Arc<SessionManagerAdapter>,
    // Application services
    pub settings: Arc<SettingsService>,
    pub ordering: Arc<OrderingPolicy>,
    pub approvals: Arc<ApprovalService>,
    pub creation: Arc<CharacterCreationService>,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        // an in-memory database exists per connection
        let max_connections = if config.database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&config.database_url)
            .await
            .with_context(|| format!("Failed to open database {}", config.database_url))?;

        let compendium = JsonCompendium::load(&config.compendium_dir)
            .await
            .context("Failed to load compendium packs")?;

        Self::assemble(pool, Arc::new(compendium)).await
    }

    async fn assemble(
        pool: SqlitePool,
        compendium: Arc<dyn CompendiumPort>,
    ) -> Result<Self> {
        let settings_repository = SqliteSettingsRepository::new(pool.clone()).await?;
        let drafts = SqliteDraftRepository::new(pool).await?;

        let sessions = Arc::new(SessionManagerAdapter::default());
        let actors = Arc::new(InMemoryActorRepository::new());

        let settings = Arc::new(SettingsService::new(Arc::new(settings_repository)));
        let ordering = Arc::new(OrderingPolicy::new(settings.clone()));
        let approvals = Arc::new(ApprovalService::new(sessions.clone()));
        let ports = CreationPorts {
            compendium,
            actors,
            users: sessions.clone(),
            drafts: Arc::new(drafts),
            notifier: sessions.clone(),
            host: sessions.clone(),
        };
        let creation = Arc::new(CharacterCreationService::new(
            ports,
            settings.clone(),
            approvals.clone(),
        ));

        Ok(Self {
            sessions,
            settings,
            ordering,
            approvals,
            creation,
        })
    }
}

/// State over an in-memory database and an empty compendium
#[cfg(test)]
pub async fn test_state() -> Arc<AppState> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let compendium = Arc::new(JsonCompendium::from_documents(Vec::new()));
    Arc::new(AppState::assemble(pool, compendium).await.unwrap())
}
