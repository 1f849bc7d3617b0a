use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::backend::{status_error, SemanticBackend, SemanticHit};
use crate::config::SemanticConfig;
use crate::error::BackendError;
use crate::models::ProductSummary;

/// HTTP client for the vector similarity engine.
pub struct HttpSemanticBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSemanticBackend {
    pub fn new(client: reqwest::Client, config: &SemanticConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Similarity floor sent with every request. The engine otherwise applies
/// its own cutoff; thresholds belong to the fusion stage.
const ENGINE_MIN_SCORE: f64 = 0.0;

#[derive(Serialize)]
struct SemanticSearchRequest<'a> {
    query: &'a str,
    limit: usize,
    min_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<&'a HashMap<String, String>>,
}

#[derive(Deserialize)]
struct SemanticSearchResponse {
    results: Vec<SemanticSearchItem>,
}

#[derive(Deserialize)]
struct SemanticSearchItem {
    product_id: String,
    score: f64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    price: Option<f64>,
}

#[async_trait]
impl SemanticBackend for HttpSemanticBackend {
    async fn search(
        &self,
        text: &str,
        filters: &HashMap<String, String>,
        limit: usize,
    ) -> Result<Vec<SemanticHit>, BackendError> {
        let url = format!("{}/api/v1/search", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(&SemanticSearchRequest {
                query: text,
                limit,
                min_score: ENGINE_MIN_SCORE,
                filters: (!filters.is_empty()).then_some(filters),
            })
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let body: SemanticSearchResponse = resp.json().await?;
        into_hits(body)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!("Semantic engine health check failed: {e}");
                false
            }
        }
    }
}

fn into_hits(body: SemanticSearchResponse) -> Result<Vec<SemanticHit>, BackendError> {
    body.results
        .into_iter()
        .map(|item| {
            if item.product_id.trim().is_empty() {
                return Err(BackendError::Decode("semantic result with empty product_id".into()));
            }
            if !item.score.is_finite() {
                return Err(BackendError::Decode(format!(
                    "non-finite score for product {}",
                    item.product_id
                )));
            }
            Ok(SemanticHit {
                product_id: item.product_id,
                score: item.score,
                summary: ProductSummary {
                    name: item.name,
                    brand: item.brand,
                    price: item.price,
                    ..Default::default()
                },
            })
        })
        .collect()
}
