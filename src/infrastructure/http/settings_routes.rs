use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::domain::value_objects::{validate_ordering, MancerSettings, OrderingEntry};
use crate::infrastructure::state::AppState;

pub fn settings_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/settings/reset", post(reset_settings))
        .route(
            "/api/settings/advancement-order",
            get(get_advancement_order).put(update_advancement_order),
        )
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<MancerSettings> {
    Json(state.settings.get().await)
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<MancerSettings>,
) -> Result<Json<MancerSettings>, (StatusCode, String)> {
    validate_ordering(&settings.advancement_order)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    state
        .settings
        .update(settings.clone())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(settings))
}

async fn reset_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MancerSettings>, (StatusCode, String)> {
    state
        .settings
        .reset()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// The effective ordering, sorted as it will be applied
async fn get_advancement_order(State(state): State<Arc<AppState>>) -> Json<Vec<OrderingEntry>> {
    let mut order = state.ordering.get_order().await;
    order.sort_by_key(|entry| entry.order);
    Json(order)
}

async fn update_advancement_order(
    State(state): State<Arc<AppState>>,
    Json(order): Json<Vec<OrderingEntry>>,
) -> Result<Json<Vec<OrderingEntry>>, (StatusCode, String)> {
    validate_ordering(&order).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut settings = state.settings.get().await;
    settings.advancement_order = order.clone();
    state
        .settings
        .update(settings)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(order))
}
