//! # Prices - zipped CSV import/export over HTTP
//!
//! Accepts price lists as a zip file holding one CSV, stores the valid rows
//! in PostgreSQL and answers with totals over everything stored so far.
//! The whole table can be downloaded back as a zipped CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌──────────┐
//! │  data.zip │──▶│  archive  │──▶│  parser   │──▶│ validation │──▶│  store   │──▶ totals
//! │  (upload) │   │ (extract) │   │  (rows)   │   │ (skip bad) │   │ (1 txn)  │
//! └───────────┘   └───────────┘   └───────────┘   └────────────┘   └──────────┘
//!
//!   store.fetch_all ──▶ parser::write_records ──▶ archive::package ──▶ data.zip
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use prices::{ImportPipeline, MemoryStore, RequestLog};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pipeline = ImportPipeline::new(Arc::new(MemoryStore::new()));
//!     let bytes = std::fs::read("data.zip").unwrap();
//!     let summary = pipeline.run(&bytes, &RequestLog::start()).await.unwrap();
//!     println!("{} items stored", summary.totals.total_items);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`config`] - Environment configuration
//! - [`models`] - Records and totals
//! - [`archive`] - Zip container codec
//! - [`parser`] - CSV codec
//! - [`validation`] - Row validation
//! - [`store`] - Storage backends and aggregation
//! - [`pipeline`] - Import and export pipelines
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Codecs
pub mod archive;
pub mod parser;

// Validation
pub mod validation;

// Storage
pub mod store;

// Orchestration
pub mod pipeline;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ArchiveError,
    ConfigError,
    CsvError,
    ErrorKind,
    PipelineError,
    ServerError,
    StoreError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{AggregateResult, CandidateRecord, PersistedRecord};

// =============================================================================
// Re-exports - Codecs & validation
// =============================================================================

pub use archive::{extract, package, ExtractedMember};
pub use parser::{parse_rows, write_records, Row};
pub use validation::{validate_row, validate_rows, ValidationOutcome};

// =============================================================================
// Re-exports - Storage
// =============================================================================

pub use store::{MemoryStore, PostgresStore, PriceStore};

// =============================================================================
// Re-exports - Pipelines
// =============================================================================

pub use pipeline::{ExportArchive, ExportPipeline, ImportPipeline, ImportSummary};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::logs::RequestLog;
pub use config::{ServerConfig, StoreConfig};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
