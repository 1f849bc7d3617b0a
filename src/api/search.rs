use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::SearchError;
use crate::models::{SearchRequest, SearchResponse};
use crate::search::pipeline::run_search;
use crate::state::AppState;

/// POST /api/v1/search - Hybrid product search:
///   1. Structured extraction (filters, search terms, graph query)
///   2. Graph query validation, then semantic + graph retrieval in parallel
///   3. Weighted fusion with a bonus for products both backends agree on
pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("search", %request_id);

    async move {
        tracing::info!(query = %req.query, limit = req.limit, "search request");
        run_search(&state.backends, &state.config, request_id, req)
            .await
            .map(Json)
            .map_err(|e| {
                tracing::warn!("Search failed: {e}");
                (status_for(&e), e.to_string())
            })
    }
    .instrument(span)
    .await
}

fn status_for(err: &SearchError) -> StatusCode {
    match err {
        SearchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        SearchError::TotalUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        SearchError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&SearchError::InvalidRequest("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SearchError::TotalUnavailable {
                semantic: "timed out".into(),
                graph: "failed: boom".into(),
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&SearchError::Config("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
