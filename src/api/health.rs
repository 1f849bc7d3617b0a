use axum::extract::State;
use axum::Json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// GET /health - Probe both backends concurrently.
///
/// Always answers 200; `status` is "healthy" only when both are reachable.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (semantic_engine_connected, graph_service_connected) = tokio::join!(
        state.backends.semantic.health_check(),
        state.backends.graph.health_check(),
    );

    let status = if semantic_engine_connected && graph_service_connected {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        semantic_engine_connected,
        graph_service_connected,
    })
}
