use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Which retrieval backend produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Semantic,
    Graph,
}

/// A single product match from one backend. The score is only meaningful
/// relative to other candidates from the same source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalCandidate {
    pub product_id: String,
    pub source_score: f64,
    pub source: Source,
}

/// A product after fusion, with both component scores and the combined rank score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedResult {
    pub product_id: String,
    pub semantic_score: f64,
    pub graph_score: f64,
    pub found_in_both: bool,
    pub combined_score: f64,
}

/// Descriptive product fields carried alongside scores. Never used for ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductSummary {
    /// Fill fields that are still empty from `other`.
    pub fn fill_from(&mut self, other: &ProductSummary) {
        if self.name.is_none() {
            self.name = other.name.clone();
        }
        if self.brand.is_none() {
            self.brand = other.brand.clone();
        }
        if self.price.is_none() {
            self.price = other.price;
        }
        if self.color.is_none() {
            self.color = other.color.clone();
        }
        if self.description.is_none() {
            self.description = other.description.clone();
        }
    }
}

/// Request-scoped bundle built once at request entry.
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    pub free_text: String,
    pub structured_filters: HashMap<String, String>,
    pub generated_graph_query: Option<String>,
}

/// Search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Extra filters merged over the extracted ones (caller wins)
    #[serde(default)]
    pub filters: Option<HashMap<String, String>>,
    pub min_semantic_score: Option<f64>,
}

fn default_limit() -> usize {
    10
}

/// Outcome of one retrieval branch, reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BranchStatus {
    Ok { candidates: usize },
    Skipped { reason: String },
    Failed { reason: String },
    TimedOut,
}

impl BranchStatus {
    /// Whether this branch produced a usable (possibly empty) candidate list.
    pub fn is_available(&self) -> bool {
        matches!(self, BranchStatus::Ok { .. })
    }

    pub fn reason(&self) -> String {
        match self {
            BranchStatus::Ok { candidates } => format!("ok ({candidates} candidates)"),
            BranchStatus::Skipped { reason } => format!("skipped: {reason}"),
            BranchStatus::Failed { reason } => format!("failed: {reason}"),
            BranchStatus::TimedOut => "timed out".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendReport {
    pub semantic: BranchStatus,
    pub graph: BranchStatus,
}

/// One ranked product in the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProduct {
    pub product_id: String,
    pub combined_score: f64,
    pub semantic_score: f64,
    pub graph_score: f64,
    pub found_in_both: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSummary>,
}

/// Search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub request_id: Uuid,
    pub query: String,
    /// Text actually sent to the semantic backend
    pub search_text: String,
    pub graph_query: Option<String>,
    /// Verdict for `graph_query`, absent when none was generated
    pub graph_query_verdict: Option<ValidationVerdictView>,
    pub backends: BackendReport,
    pub results: Vec<RankedProduct>,
}

/// Serializable mirror of a validation verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationVerdictView {
    pub allowed: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub semantic_engine_connected: bool,
    pub graph_service_connected: bool,
}
