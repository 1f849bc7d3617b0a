use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::backend::{status_error, Extraction, QueryExtractor};
use crate::config::LlmConfig;
use crate::error::BackendError;

/// Structured query extraction backed by a chat-completion model.
pub struct LlmExtractor {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmExtractor {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl QueryExtractor for LlmExtractor {
    async fn extract(&self, text: &str) -> Result<Extraction, BackendError> {
        let prompt = build_prompt(text);

        let response = match self.config.provider.as_str() {
            "ollama" => call_ollama(&self.client, &self.config, &prompt).await?,
            "openai" => call_openai(&self.client, &self.config, &prompt).await?,
            other => {
                return Err(BackendError::NotConfigured(format!(
                    "no extraction for LLM provider `{other}`"
                )))
            }
        };

        Ok(parse_extraction(&response))
    }
}

fn build_prompt(user_query: &str) -> String {
    format!(
        "You turn product search requests into structured search input.\n\n\
         Graph schema:\n\
         - Node: Product with properties id, name, brand, color, price, description, tags (list)\n\n\
         Produce a JSON object with exactly these keys:\n\
         - \"search_terms\": the core product keywords for similarity search, filler words removed\n\
         - \"filters\": an object of attribute constraints such as brand, color, max_price, min_price\n\
         - \"graph_query\": a read-only pattern query of the form \
         MATCH (p:Product) WHERE ... RETURN p LIMIT 10\n\n\
         The graph query must start with MATCH, bind products to `p`, and return `p`. \
         Never use CALL, CREATE, MERGE, SET, DELETE, REMOVE or any other write clause. \
         Match text properties case-insensitively with toLower(...) CONTAINS '...'.\n\n\
         Example:\n\
         Request: \"red nike running shoes under $100\"\n\
         {{\"search_terms\": \"nike running shoes\", \
         \"filters\": {{\"brand\": \"Nike\", \"color\": \"Red\", \"max_price\": 100}}, \
         \"graph_query\": \"MATCH (p:Product) WHERE toLower(p.brand) = 'nike' \
         AND toLower(p.color) = 'red' AND p.price <= 100 RETURN p LIMIT 10\"}}\n\n\
         Request: \"{user_query}\"\n\n\
         Respond with ONLY the JSON object. No explanation."
    )
}

#[derive(Deserialize)]
struct RawExtraction {
    #[serde(default)]
    search_terms: Option<String>,
    #[serde(default)]
    filters: Option<HashMap<String, Value>>,
    #[serde(default)]
    graph_query: Option<String>,
}

/// Pull an [`Extraction`] out of a model reply. Unusable output yields an
/// empty extraction rather than an error.
fn parse_extraction(content: &str) -> Extraction {
    // Extract JSON object from response
    let json_str = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    };

    let raw = match serde_json::from_str::<RawExtraction>(json_str) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Failed to parse extraction: {e}. Raw: {content}");
            return Extraction::default();
        }
    };

    let filters = raw
        .filters
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_string();
            let value = match value {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            (!key.is_empty() && !value.is_empty()).then_some((key, value))
        })
        .collect();

    Extraction {
        filters,
        graph_query: non_blank(raw.graph_query),
        search_terms: non_blank(raw.search_terms),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    format: &'static str,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String, BackendError> {
    let url = format!("{}/api/chat", config.base_url.trim_end_matches('/'));

    let req = OllamaChatRequest {
        model: config.chat_model.clone(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        stream: false,
        format: "json",
    };

    let resp = client.post(&url).json(&req).send().await?;
    if !resp.status().is_success() {
        return Err(status_error(resp).await);
    }

    let body: OllamaChatResponse = resp.json().await?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String, BackendError> {
    let url = format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/'));
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.chat_model.clone(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        temperature: 0.0,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await?;
    if !resp.status().is_success() {
        return Err(status_error(resp).await);
    }

    let body: OpenAiChatResponse = resp.json().await?;
    Ok(body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}
