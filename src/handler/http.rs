use crate::{
    config::LEADERBOARD_LIMIT,
    leaderboard::{Leaderboard, load_leaderboard},
    server::AppState,
};
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use log::error;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

async fn health_check() -> &'static str {
    "OK"
}

async fn leaderboard(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Leaderboard>, (StatusCode, String)> {
    load_leaderboard(
        app_state.store.as_ref(),
        &app_state.config.results_prefix,
        LEADERBOARD_LIMIT,
    )
    .await
    .map(Json)
    .map_err(|e| {
        error!("Failed to load leaderboard: {e:?}");
        (
            StatusCode::BAD_GATEWAY,
            "Failed to load leaderboard".to_string(),
        )
    })
}

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/leaderboard", get(leaderboard))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
