//! Import and export pipelines.
//!
//! ```text
//! import:  zip bytes ─▶ archive::extract ─▶ parser::parse_rows
//!                    ─▶ validation::validate_rows ─▶ store.import_batch ─▶ totals
//!
//! export:  store.fetch_all ─▶ parser::write_records ─▶ archive::package ─▶ zip bytes
//! ```
//!
//! Both pipelines hold the shared store handle they were built with and keep
//! no other state, so one instance serves every concurrent request.

pub mod export;
pub mod import;

pub use export::{ExportArchive, ExportPipeline};
pub use import::{ImportPipeline, ImportSummary};
