//! Concurrent fan-out to the semantic and graph backends.
//!
//! Both branches start together, share one deadline, and are joined at a
//! single rendezvous. A branch that does not finish with a result becomes
//! an empty candidate list plus a recorded reason. Only when neither branch
//! is usable does the request fail.

use std::collections::HashMap;
use tokio::time::{timeout_at, Instant};

use crate::backend::{GraphBackend, GraphProduct, SemanticBackend, SemanticHit};
use crate::error::SearchError;
use crate::models::{BackendReport, BranchStatus, ProductSummary, QueryPlan, RetrievalCandidate, Source};
use crate::search::validator::{self, ValidationVerdict};

/// Presence score for a graph match before fusion weighting.
const GRAPH_PRESENCE_SCORE: f64 = 1.0;

/// Everything the fusion stage and the response need from one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub semantic: Vec<RetrievalCandidate>,
    pub graph: Vec<RetrievalCandidate>,
    /// Descriptive fields per product id, semantic first, graph filling gaps
    pub summaries: HashMap<String, ProductSummary>,
    /// Verdict for the generated graph query, if one was generated
    pub verdict: Option<ValidationVerdict>,
    pub report: BackendReport,
}

enum Branch<T> {
    Done(Vec<T>),
    Skipped(String),
    Failed(String),
    TimedOut,
}

impl<T> Branch<T> {
    fn split(self) -> (Vec<T>, BranchStatus) {
        match self {
            Branch::Done(items) => {
                let candidates = items.len();
                (items, BranchStatus::Ok { candidates })
            }
            Branch::Skipped(reason) => (Vec::new(), BranchStatus::Skipped { reason }),
            Branch::Failed(reason) => (Vec::new(), BranchStatus::Failed { reason }),
            Branch::TimedOut => (Vec::new(), BranchStatus::TimedOut),
        }
    }
}

/// Run both retrieval branches for `plan` and wait for both to settle.
///
/// The graph branch only runs when the plan carries a generated query that
/// passes [`validator::validate`].
///
/// # Errors
///
/// Returns [`SearchError::TotalUnavailable`] when neither branch produced a
/// usable result. A branch that succeeds with zero candidates is usable.
pub async fn dispatch(
    semantic: &dyn SemanticBackend,
    graph: &dyn GraphBackend,
    plan: &QueryPlan,
    fetch_limit: usize,
    deadline: Instant,
) -> Result<DispatchOutcome, SearchError> {
    let verdict = plan.generated_graph_query.as_deref().map(validator::validate);

    let semantic_branch = async {
        match timeout_at(
            deadline,
            semantic.search(&plan.free_text, &plan.structured_filters, fetch_limit),
        )
        .await
        {
            Ok(Ok(hits)) => Branch::Done(hits),
            Ok(Err(err)) => Branch::Failed(err.to_string()),
            Err(_) => Branch::TimedOut,
        }
    };

    let graph_branch = async {
        let query = match (&plan.generated_graph_query, &verdict) {
            (Some(query), Some(v)) if v.allowed => query,
            (Some(_), Some(v)) => return Branch::Skipped(v.reason.clone()),
            _ => return Branch::Skipped("no graph query generated".to_string()),
        };
        match timeout_at(deadline, graph.execute_read_query(query)).await {
            Ok(Ok(products)) => Branch::Done(products),
            Ok(Err(err)) => Branch::Failed(err.to_string()),
            Err(_) => Branch::TimedOut,
        }
    };

    let (semantic_result, graph_result) = tokio::join!(semantic_branch, graph_branch);

    let (hits, semantic_status) = semantic_result.split();
    let (products, graph_status) = graph_result.split();

    log_branch("semantic", &semantic_status);
    log_branch("graph", &graph_status);

    if !semantic_status.is_available() && !graph_status.is_available() {
        return Err(SearchError::TotalUnavailable {
            semantic: semantic_status.reason(),
            graph: graph_status.reason(),
        });
    }

    let mut summaries = HashMap::new();
    let semantic_candidates = semantic_candidates(hits, &mut summaries);
    let graph_candidates = graph_candidates(products, &mut summaries);

    Ok(DispatchOutcome {
        semantic: semantic_candidates,
        graph: graph_candidates,
        summaries,
        verdict,
        report: BackendReport {
            semantic: semantic_status,
            graph: graph_status,
        },
    })
}

fn semantic_candidates(
    hits: Vec<SemanticHit>,
    summaries: &mut HashMap<String, ProductSummary>,
) -> Vec<RetrievalCandidate> {
    let mut candidates = Vec::with_capacity(hits.len());
    for hit in hits {
        if !hit.score.is_finite() {
            tracing::warn!(product_id = %hit.product_id, "dropping semantic hit with non-finite score");
            continue;
        }
        summaries
            .entry(hit.product_id.clone())
            .or_default()
            .fill_from(&hit.summary);
        candidates.push(RetrievalCandidate {
            product_id: hit.product_id,
            source_score: hit.score,
            source: Source::Semantic,
        });
    }
    candidates
}

fn graph_candidates(
    products: Vec<GraphProduct>,
    summaries: &mut HashMap<String, ProductSummary>,
) -> Vec<RetrievalCandidate> {
    products
        .into_iter()
        .map(|product| {
            summaries
                .entry(product.id.clone())
                .or_default()
                .fill_from(&product.summary);
            RetrievalCandidate {
                product_id: product.id,
                source_score: GRAPH_PRESENCE_SCORE,
                source: Source::Graph,
            }
        })
        .collect()
}

fn log_branch(branch: &str, status: &BranchStatus) {
    match status {
        BranchStatus::Ok { candidates } => {
            tracing::debug!(branch, candidates, "branch returned candidates");
        }
        other => {
            tracing::warn!(branch, status = %other.reason(), "branch unavailable");
        }
    }
}
