use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::backend::{Extraction, GraphBackend, QueryExtractor, SemanticBackend};
use crate::config::Config;
use crate::error::SearchError;
use crate::models::{
    ProductSummary, QueryPlan, RankedProduct, SearchRequest, SearchResponse,
    ValidationVerdictView,
};
use crate::search::dispatch::dispatch;
use crate::search::fusion::fuse;

/// The collaborators one search needs. Cheap to clone.
#[derive(Clone)]
pub struct SearchBackends {
    pub semantic: Arc<dyn SemanticBackend>,
    pub graph: Arc<dyn GraphBackend>,
    /// `None` disables extraction; every request then runs semantic-only.
    pub extractor: Option<Arc<dyn QueryExtractor>>,
}

/// Full search pipeline:
///   1. Structured extraction (filters, search terms, graph query)
///   2. Concurrent semantic + graph retrieval under one deadline
///   3. Weighted fusion, tie-breaking, truncation
pub async fn run_search(
    backends: &SearchBackends,
    config: &Config,
    request_id: Uuid,
    req: SearchRequest,
) -> Result<SearchResponse, SearchError> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err(SearchError::InvalidRequest("query is required".into()));
    }
    if req.limit == 0 {
        return Err(SearchError::InvalidRequest("limit must be at least 1".into()));
    }
    if matches!(req.min_semantic_score, Some(v) if !v.is_finite()) {
        return Err(SearchError::InvalidRequest(
            "min_semantic_score must be a finite number".into(),
        ));
    }
    let limit = req.limit.min(config.max_limit);

    // ── Step 1: Structured extraction ───────────────────────
    let extraction = extract_or_empty(backends, config, &query).await;

    let mut filters = extraction.filters;
    if let Some(caller_filters) = req.filters {
        filters.extend(caller_filters);
    }
    let plan = QueryPlan {
        free_text: extraction.search_terms.unwrap_or_else(|| query.clone()),
        structured_filters: filters,
        generated_graph_query: extraction.graph_query,
    };
    tracing::info!(
        search_text = %plan.free_text,
        filters = plan.structured_filters.len(),
        graph_query = plan.generated_graph_query.as_deref().unwrap_or(""),
        "query plan built"
    );

    // ── Step 2: Dual-source dispatch ────────────────────────
    let deadline = Instant::now() + config.deadline();
    let fetch_limit = limit.saturating_mul(config.fetch_multiplier);
    let outcome = dispatch(
        backends.semantic.as_ref(),
        backends.graph.as_ref(),
        &plan,
        fetch_limit,
        deadline,
    )
    .await?;

    // ── Step 3: Fusion ──────────────────────────────────────
    let min_semantic_score = req.min_semantic_score.or(config.fusion.min_semantic_score);
    let fused = fuse(
        &outcome.semantic,
        &outcome.graph,
        &config.fusion,
        min_semantic_score,
        limit,
    );
    tracing::info!(
        semantic = outcome.semantic.len(),
        graph = outcome.graph.len(),
        results = fused.len(),
        "fusion complete"
    );

    let results = fused
        .into_iter()
        .map(|r| {
            let product = outcome
                .summaries
                .get(&r.product_id)
                .filter(|s| **s != ProductSummary::default())
                .cloned();
            RankedProduct {
                product_id: r.product_id,
                combined_score: r.combined_score,
                semantic_score: r.semantic_score,
                graph_score: r.graph_score,
                found_in_both: r.found_in_both,
                product,
            }
        })
        .collect();

    Ok(SearchResponse {
        request_id,
        query,
        search_text: plan.free_text,
        graph_query: plan.generated_graph_query,
        graph_query_verdict: outcome.verdict.map(|v| ValidationVerdictView {
            allowed: v.allowed,
            reason: v.reason,
        }),
        backends: outcome.report,
        results,
    })
}

/// Any extraction failure degrades to an empty extraction.
async fn extract_or_empty(backends: &SearchBackends, config: &Config, query: &str) -> Extraction {
    let Some(extractor) = &backends.extractor else {
        return Extraction::default();
    };
    let budget = Duration::from_millis(config.extraction_timeout_ms);
    match tokio::time::timeout(budget, extractor.extract(query)).await {
        Ok(Ok(extraction)) => extraction,
        Ok(Err(e)) => {
            tracing::warn!("Structured extraction failed: {e}");
            Extraction::default()
        }
        Err(_) => {
            tracing::warn!("Structured extraction timed out after {budget:?}");
            Extraction::default()
        }
    }
}
