//! Error types for the product search orchestrator.
//!
//! Branch-local failures ([`BackendError`]) are absorbed by the dispatch
//! coordinator and never reach the caller on their own. Only
//! [`SearchError`] crosses the request boundary.

/// Typed failures while decoding graph backend records.
///
/// Decoding fails closed: a record with a missing or mistyped field is an
/// error, never a product with empty fields.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphDecodeError {
    /// The result set has no column holding product nodes.
    #[error("no product column in result (columns: {0})")]
    MissingColumn(String),

    /// A row value was not a property map.
    #[error("row {row}: expected a node property map")]
    NotANode { row: usize },

    /// A required property is absent.
    #[error("row {row}: missing required field `{field}`")]
    MissingField { row: usize, field: &'static str },

    /// A property is present with the wrong type.
    #[error("row {row}: field `{field}` must be {expected}")]
    WrongType {
        row: usize,
        field: &'static str,
        expected: &'static str,
    },
}

/// Errors raised by a single backend adapter.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout inside the client, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend accepted the request but reported a failure in its body.
    #[error("backend error: {0}")]
    Server(String),

    /// The response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Graph records failed schema validation.
    #[error("graph decode error: {0}")]
    GraphDecode(#[from] GraphDecodeError),

    /// The adapter refused to run a query that is not a pure read.
    #[error("query rejected: {0}")]
    Rejected(String),

    /// The adapter cannot serve requests with its current configuration.
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Http(err.to_string())
        }
    }
}

/// Errors that fail a whole search request.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Neither the semantic nor the graph branch produced a usable result.
    #[error("no backend available (semantic: {semantic}; graph: {graph})")]
    TotalUnavailable { semantic: String, graph: String },

    /// The caller's request is unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid orchestrator configuration.
    #[error("config error: {0}")]
    Config(String),
}
