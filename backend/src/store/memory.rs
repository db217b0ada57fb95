//! In-process price table.
//!
//! Mirrors the PostgreSQL table closely enough to run the pipelines without
//! a database: ids come from a counter that only moves forward, column
//! limits from [`super::schema`] are enforced, and a batch is applied only
//! once every row in it has passed.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::schema::{fit_price, MAX_TEXT_LEN};
use super::PriceStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{AggregateResult, CandidateRecord, PersistedRecord};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: Vec<PersistedRecord>,
}

/// Price store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply column constraints to one candidate.
    fn check(candidate: &CandidateRecord) -> StoreResult<CandidateRecord> {
        for (column, value) in [("name", &candidate.name), ("category", &candidate.category)] {
            let len = value.chars().count();
            if len > MAX_TEXT_LEN {
                return Err(StoreError::Constraint(format!(
                    "value too long for {} ({} > {} characters)",
                    column, len, MAX_TEXT_LEN
                )));
            }
        }

        let price = fit_price(candidate.price).ok_or_else(|| {
            StoreError::Constraint(format!("numeric field overflow for price {}", candidate.price))
        })?;

        Ok(CandidateRecord {
            price,
            ..candidate.clone()
        })
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn import_batch(&self, candidates: &[CandidateRecord]) -> StoreResult<AggregateResult> {
        let mut table = self.table.lock().await;

        // Stage the whole batch first; the table is untouched on failure.
        let mut staged = Vec::with_capacity(candidates.len());
        let mut next_id = table.next_id;
        for candidate in candidates {
            let checked = Self::check(candidate)?;
            next_id += 1;
            staged.push(PersistedRecord::from_candidate(next_id, checked));
        }

        table.next_id = next_id;
        table.rows.extend(staged);

        Ok(AggregateResult::from_records(&table.rows))
    }

    async fn fetch_all(&self) -> StoreResult<Vec<PersistedRecord>> {
        let table = self.table.lock().await;
        Ok(table.rows.clone())
    }
}
