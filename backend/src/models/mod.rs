//! Domain models for the price pipeline.
//!
//! - [`CandidateRecord`] - a CSV row that passed validation
//! - [`PersistedRecord`] - a stored row with its store-assigned id
//! - [`AggregateResult`] - whole-table totals returned by an import

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Records
// =============================================================================

/// A validated row, ready to be inserted.
///
/// `create_date` is opaque text: it is stored exactly as uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub create_date: String,
}

/// A row as stored. `id` is assigned by the store and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub create_date: String,
}

impl PersistedRecord {
    /// Build the stored form of a candidate.
    pub fn from_candidate(id: i64, candidate: CandidateRecord) -> Self {
        Self {
            id,
            name: candidate.name,
            category: candidate.category,
            price: candidate.price,
            create_date: candidate.create_date,
        }
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// Totals over every stored record, as of the import's commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Number of stored rows.
    pub total_items: i64,
    /// Number of distinct categories.
    pub total_categories: i64,
    /// Exact sum of all prices, sent as a JSON number with every digit kept.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_price: Decimal,
}

impl AggregateResult {
    /// Compute totals from a full table snapshot.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PersistedRecord>) -> Self {
        let mut categories = std::collections::HashSet::new();
        let mut totals = AggregateResult::default();

        for record in records {
            totals.total_items += 1;
            totals.total_price += record.price;
            categories.insert(record.category.as_str());
        }

        totals.total_categories = categories.len() as i64;
        totals
    }
}
