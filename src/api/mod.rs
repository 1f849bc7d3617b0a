pub mod health;
pub mod search;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// All HTTP routes served by the orchestrator.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/search", post(search::search))
        .with_state(state)
}
