//! # product-search
//!
//! A Rust web service that answers natural-language product queries by
//! combining a vector similarity engine with a graph database, then fusing
//! both ranked lists into one.
//!
//! ## Architecture
//!
//! Every request flows through the same pipeline:
//!
//! ```text
//!                          ┌─────────────┐
//!                          │  User Query  │
//!                          └──────┬───────┘
//!                                 │
//!                                 ▼
//!                  ┌───────────────────────────┐
//!                  │  Structured Extraction    │
//!                  │  search terms, filters,   │
//!                  │  generated graph query    │
//!                  └─────────────┬─────────────┘
//!                                │
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │  Read-only Validation     │
//!                  │  MATCH ... RETURN, no     │
//!                  │  write/procedure keywords │
//!                  └─────────────┬─────────────┘
//!                                │ one shared deadline
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//!        ┌────────────────┐           ┌──────────────────┐
//!        │ Semantic Search │           │   Graph Query     │
//!        │ limit × mult    │           │ skipped if absent │
//!        │                 │           │ or rejected       │
//!        └────────┬───────┘           └─────────┬────────┘
//!                 │ ok / failed / timed out      │
//!                 └──────────────┬──────────────┘
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │  Weighted Fusion          │
//!                  │  0.5·sem + 0.5·graph      │
//!                  │  +0.05 if found in both   │
//!                  │  stable tie-breaks        │
//!                  └─────────────┬─────────────┘
//!                                │
//!                                ▼
//!                  ┌───────────────────────────┐
//!                  │   Ranked Products         │
//!                  └───────────────────────────┘
//! ```
//!
//! A branch that fails or misses the deadline is reported and dropped; the
//! request only fails when neither branch produced a result.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, backends, fusion and LLM settings
//! - [`models`] - Shared data types: candidates, fused results, request/response types
//! - [`error`] - Backend, graph decode and request-level error types
//! - [`backend`] - Collaborator traits plus HTTP adapters for the semantic engine and graph store
//! - [`llm::extract`] - LLM-powered structured extraction (terms, filters, graph query)
//! - [`search::validator`] - Read-only graph query validation
//! - [`search::dispatch`] - Concurrent dual-source retrieval under a shared deadline
//! - [`search::fusion`] - Weighted score fusion with diversity bonus and deterministic ordering
//! - [`search::pipeline`] - End-to-end search over injected backends
//! - [`api`] - Axum HTTP handlers for search and health
//! - [`state`] - Shared application state wiring config to backends

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod search;
pub mod state;
