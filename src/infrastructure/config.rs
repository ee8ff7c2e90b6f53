//! Application configuration

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite URL for settings and drafts
    pub database_url: String,

    /// Directory holding compendium packs, one JSON file per pack
    pub compendium_dir: PathBuf,

    /// HTTP/WebSocket server port
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://hero_mancer.db?mode=rwc".to_string()),

            compendium_dir: env::var("COMPENDIUM_DIR")
                .unwrap_or_else(|_| "./packs".to_string())
                .into(),

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }
}
