use std::sync::Arc;
use std::time::Duration;

use crate::backend::graph::HttpGraphBackend;
use crate::backend::semantic::HttpSemanticBackend;
use crate::backend::QueryExtractor;
use crate::config::Config;
use crate::llm::extract::LlmExtractor;
use crate::search::pipeline::SearchBackends;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backends: SearchBackends,
}

impl AppState {
    /// Wire the HTTP adapters for every backend named in `config`.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        // Per-call budgets are enforced by the pipeline; this only bounds stuck sockets.
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()?;

        let extractor: Option<Arc<dyn QueryExtractor>> = match config.llm.provider.as_str() {
            "none" => None,
            _ => Some(Arc::new(LlmExtractor::new(
                http_client.clone(),
                config.llm.clone(),
            ))),
        };

        let backends = SearchBackends {
            semantic: Arc::new(HttpSemanticBackend::new(
                http_client.clone(),
                &config.semantic,
            )),
            graph: Arc::new(HttpGraphBackend::new(http_client, &config.graph)),
            extractor,
        };

        Ok(Self::with_backends(config, backends))
    }

    /// Build state around already-constructed backends.
    pub fn with_backends(config: Config, backends: SearchBackends) -> Self {
        Self {
            config: Arc::new(config),
            backends,
        }
    }
}
