//! Contracts for the external collaborators the orchestrator depends on.
//!
//! The core only sees these traits; [`semantic`] and [`graph`] hold the
//! HTTP implementations wired up by [`crate::state::AppState`].

pub mod graph;
pub mod semantic;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::BackendError;
use crate::models::ProductSummary;

/// A similarity match from the vector engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticHit {
    pub product_id: String,
    /// Similarity in the backend's normalized range.
    pub score: f64,
    pub summary: ProductSummary,
}

/// A product record returned by a read query against the graph store.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphProduct {
    pub id: String,
    pub summary: ProductSummary,
}

/// Structured payload pulled out of free text by the extraction collaborator.
/// Every field may be empty; an empty payload behaves like a miss.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub filters: HashMap<String, String>,
    pub graph_query: Option<String>,
    pub search_terms: Option<String>,
}

/// Vector similarity engine.
#[async_trait]
pub trait SemanticBackend: Send + Sync {
    async fn search(
        &self,
        text: &str,
        filters: &HashMap<String, String>,
        limit: usize,
    ) -> Result<Vec<SemanticHit>, BackendError>;

    async fn health_check(&self) -> bool;
}

/// Graph store that executes read-only pattern queries.
///
/// Implementations must refuse anything that is not a pure read, even though
/// the orchestrator validates queries before dispatch.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    async fn execute_read_query(&self, query: &str) -> Result<Vec<GraphProduct>, BackendError>;

    async fn health_check(&self) -> bool;
}

/// Turns natural-language text into filters and a generated graph query.
#[async_trait]
pub trait QueryExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Extraction, BackendError>;
}

/// Read a non-success response into a [`BackendError::Status`].
pub(crate) async fn status_error(resp: reqwest::Response) -> BackendError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    BackendError::Status { status, body }
}
