//! Graph store adapter over the HTTP transaction API.
//!
//! Every query is re-validated here before it leaves the process and is sent
//! with a read access mode, so the store refuses writes even if validation
//! were bypassed upstream. Returned nodes are decoded against a fixed
//! product schema; anything that does not fit fails the whole call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::backend::{status_error, GraphBackend, GraphProduct};
use crate::config::GraphConfig;
use crate::error::{BackendError, GraphDecodeError};
use crate::models::ProductSummary;
use crate::search::validator;

/// Column the generated queries project product nodes into (`RETURN p`).
const PRODUCT_COLUMN: &str = "p";

pub struct HttpGraphBackend {
    client: reqwest::Client,
    base_url: String,
    database: String,
    credentials: Option<(String, Option<String>)>,
}

impl HttpGraphBackend {
    pub fn new(client: reqwest::Client, config: &GraphConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            credentials: config
                .user
                .clone()
                .map(|user| (user, config.password.clone())),
        }
    }
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

#[async_trait]
impl GraphBackend for HttpGraphBackend {
    async fn execute_read_query(&self, query: &str) -> Result<Vec<GraphProduct>, BackendError> {
        let verdict = validator::validate(query);
        if !verdict.allowed {
            return Err(BackendError::Rejected(verdict.reason));
        }

        let url = format!("{}/db/{}/tx/commit", self.base_url, self.database);
        let mut req = self
            .client
            .post(&url)
            .header("Access-Mode", "READ")
            .json(&TxRequest {
                statements: vec![Statement { statement: query }],
            });
        if let Some((user, password)) = &self.credentials {
            req = req.basic_auth(user, password.as_deref());
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let body: TxResponse = resp.json().await?;
        decode_response(body)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!("Graph service health check failed: {e}");
                false
            }
        }
    }
}

fn decode_response(body: TxResponse) -> Result<Vec<GraphProduct>, BackendError> {
    if let Some(err) = body.errors.first() {
        return Err(BackendError::Server(format!("{}: {}", err.code, err.message)));
    }
    let Some(result) = body.results.into_iter().next() else {
        return Ok(Vec::new());
    };
    Ok(decode_rows(&result.columns, &result.data)?)
}

fn decode_rows(columns: &[String], rows: &[TxRow]) -> Result<Vec<GraphProduct>, GraphDecodeError> {
    let column = match columns.iter().position(|c| c == PRODUCT_COLUMN) {
        Some(i) => i,
        None if columns.len() == 1 => 0,
        None => return Err(GraphDecodeError::MissingColumn(columns.join(", "))),
    };

    rows.iter()
        .enumerate()
        .map(|(row, data)| match data.row.get(column) {
            Some(Value::Object(props)) => decode_product(row, props),
            _ => Err(GraphDecodeError::NotANode { row }),
        })
        .collect()
}

fn decode_product(row: usize, props: &Map<String, Value>) -> Result<GraphProduct, GraphDecodeError> {
    let id = required_str(row, props, "id")?;
    let name = required_str(row, props, "name")?;
    Ok(GraphProduct {
        id,
        summary: ProductSummary {
            name: Some(name),
            brand: optional_str(row, props, "brand")?,
            price: optional_number(row, props, "price")?,
            color: optional_str(row, props, "color")?,
            description: optional_str(row, props, "description")?,
        },
    })
}

fn required_str(
    row: usize,
    props: &Map<String, Value>,
    field: &'static str,
) -> Result<String, GraphDecodeError> {
    match optional_str(row, props, field)? {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(GraphDecodeError::MissingField { row, field }),
    }
}

fn optional_str(
    row: usize,
    props: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, GraphDecodeError> {
    match props.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(GraphDecodeError::WrongType {
            row,
            field,
            expected: "a string",
        }),
    }
}

fn optional_number(
    row: usize,
    props: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<f64>, GraphDecodeError> {
    match props.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(GraphDecodeError::WrongType {
            row,
            field,
            expected: "a number",
        }),
    }
}
