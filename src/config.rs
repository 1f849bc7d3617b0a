use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SearchError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Shared deadline for both retrieval branches, in milliseconds
    pub deadline_ms: u64,
    /// Budget for the structured extraction call, in milliseconds
    pub extraction_timeout_ms: u64,
    /// Upper bound on the caller-requested result limit
    pub max_limit: usize,
    /// The semantic branch fetches `limit * fetch_multiplier` candidates
    pub fetch_multiplier: usize,
    /// Relevance tuning for the fusion stage
    pub fusion: FusionConfig,
    /// Vector similarity backend
    pub semantic: SemanticConfig,
    /// Graph database backend
    pub graph: GraphConfig,
    /// LLM used for structured query extraction
    pub llm: LlmConfig,
}

/// Weights and thresholds for combining semantic and graph scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    pub semantic_weight: f64,
    pub graph_weight: f64,
    /// Added once when a product is found by both backends.
    pub diversity_bonus: f64,
    /// Flat score for every graph match (the graph backend returns unscored rows).
    pub graph_base_score: f64,
    /// Products whose semantic score is below this are dropped before ranking.
    /// A per-request value overrides it.
    pub min_semantic_score: Option<f64>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.5,
            graph_weight: 0.5,
            diversity_bonus: 0.05,
            graph_base_score: 1.0,
            min_semantic_score: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Base URL of the semantic engine (e.g. "http://localhost:8000")
    pub base_url: String,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Connection settings for the graph database HTTP endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base URL of the graph HTTP API (e.g. "http://localhost:7474")
    pub base_url: String,
    /// Database name used in the transaction endpoint path
    pub database: String,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7474".to_string(),
            database: "neo4j".to_string(),
            user: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama", "openai", or "none" to disable extraction
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for extraction
    pub chat_model: String,
    /// API key (only needed for cloud providers)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            api_key: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:6969".to_string(),
            deadline_ms: 3_000,
            extraction_timeout_ms: 5_000,
            max_limit: 100,
            fetch_multiplier: 2,
            fusion: FusionConfig::default(),
            semantic: SemanticConfig::default(),
            graph: GraphConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unparsable numeric
    /// values leave the default in place.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("PRODUCT_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(v) = parse_var(&lookup, "PRODUCT_SEARCH_DEADLINE_MS") {
            config.deadline_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "PRODUCT_SEARCH_EXTRACTION_TIMEOUT_MS") {
            config.extraction_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "PRODUCT_SEARCH_MAX_LIMIT") {
            config.max_limit = v;
        }
        if let Some(v) = parse_var(&lookup, "PRODUCT_SEARCH_FETCH_MULTIPLIER") {
            config.fetch_multiplier = v;
        }

        // Fusion tuning
        if let Some(v) = parse_var(&lookup, "FUSION_SEMANTIC_WEIGHT") {
            config.fusion.semantic_weight = v;
        }
        if let Some(v) = parse_var(&lookup, "FUSION_GRAPH_WEIGHT") {
            config.fusion.graph_weight = v;
        }
        if let Some(v) = parse_var(&lookup, "FUSION_DIVERSITY_BONUS") {
            config.fusion.diversity_bonus = v;
        }
        if let Some(v) = parse_var(&lookup, "FUSION_GRAPH_BASE_SCORE") {
            config.fusion.graph_base_score = v;
        }
        if let Some(v) = parse_var(&lookup, "FUSION_MIN_SEMANTIC_SCORE") {
            config.fusion.min_semantic_score = Some(v);
        }

        // Backends
        if let Some(url) = lookup("SEMANTIC_ENGINE_URL") {
            config.semantic.base_url = url;
        }
        if let Some(url) = lookup("GRAPH_SERVICE_URL") {
            config.graph.base_url = url;
        }
        if let Some(db) = lookup("GRAPH_DATABASE") {
            config.graph.database = db;
        }
        if let Some(user) = lookup("GRAPH_USER") {
            config.graph.user = Some(user);
        }
        if let Some(password) = lookup("GRAPH_PASSWORD") {
            config.graph.password = Some(password);
        }

        // LLM
        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Some(model) = lookup("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }

        config
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    /// Reject settings that would make ranking or dispatch meaningless.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.deadline_ms == 0 {
            return Err(SearchError::Config("deadline_ms must be greater than 0".into()));
        }
        if self.extraction_timeout_ms == 0 {
            return Err(SearchError::Config(
                "extraction_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.max_limit == 0 {
            return Err(SearchError::Config("max_limit must be greater than 0".into()));
        }
        if self.fetch_multiplier == 0 {
            return Err(SearchError::Config(
                "fetch_multiplier must be greater than 0".into(),
            ));
        }
        let f = &self.fusion;
        for (name, value) in [
            ("semantic_weight", f.semantic_weight),
            ("graph_weight", f.graph_weight),
            ("diversity_bonus", f.diversity_bonus),
            ("graph_base_score", f.graph_base_score),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SearchError::Config(format!(
                    "{name} must be a finite non-negative number"
                )));
            }
        }
        if matches!(f.min_semantic_score, Some(v) if !v.is_finite()) {
            return Err(SearchError::Config("min_semantic_score must be finite".into()));
        }
        match self.llm.provider.as_str() {
            "ollama" | "openai" | "none" => Ok(()),
            other => Err(SearchError::Config(format!("unknown LLM provider: {other}"))),
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
