//! Persistence and aggregation.
//!
//! A [`PriceStore`] owns the `prices` table. An import is one unit of work:
//! every candidate is inserted and the whole-table totals are read back
//! before commit, so the totals always include the batch that was just
//! written. Any failure rolls the whole batch back.
//!
//! Backends:
//! - [`PostgresStore`] - pooled PostgreSQL connections (production)
//! - [`MemoryStore`] - in-process table with the same constraints (tests,
//!   `serve --memory`)

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{AggregateResult, CandidateRecord, PersistedRecord};

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Storage for price records.
///
/// Implementations must be safe to share between concurrent requests; a
/// request borrows the store for one unit of work and never keeps anything
/// across requests.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Insert every candidate and return totals over the whole table, all in
    /// one transaction. On error nothing from the batch is visible.
    ///
    /// An empty batch still runs and returns the current totals.
    async fn import_batch(&self, candidates: &[CandidateRecord]) -> StoreResult<AggregateResult>;

    /// Every stored record, by ascending id.
    async fn fetch_all(&self) -> StoreResult<Vec<PersistedRecord>>;
}
