//! HTTP REST API routes

mod settings_routes;

use axum::Router;
use std::sync::Arc;

use crate::infrastructure::state::AppState;

pub use settings_routes::settings_routes;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().merge(settings_routes())
}
