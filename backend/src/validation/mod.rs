//! Row validation for uploaded price lists.
//!
//! Each data row is either accepted as a [`CandidateRecord`] or skipped.
//! Skipping is not an error: the import carries on with whatever rows
//! survive, and skipped rows only show up in the logs.
//!
//! # Rules (applied in order, first failure skips the row)
//!
//! 1. At least 5 fields (`id,name,category,price,create_date`); extra
//!    trailing fields are ignored.
//! 2. `price` (field 3) is a plain decimal number: optional sign, digits,
//!    optional fraction. No exponents, no `NaN`/`inf`, no surrounding spaces.
//!    How big the number is does not matter here; range is the store's call.
//! 3. `name`, `category` and `create_date` are taken verbatim, empty or not.
//!
//! The `id` column is never read: ids are assigned by the store.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::CandidateRecord;
use crate::parser::Row;

/// Minimum number of fields for a data row.
pub const MIN_FIELDS: usize = 5;

const NAME: usize = 1;
const CATEGORY: usize = 2;
const PRICE: usize = 3;
const CREATE_DATE: usize = 4;

static DECIMAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)([0-9]*)(?:\.([0-9]*))?$").expect("Invalid decimal pattern")
});

/// Why a row was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Fewer than [`MIN_FIELDS`] fields.
    TooFewFields { found: usize },
    /// The price field is not a decimal number.
    InvalidPrice { value: String },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::TooFewFields { found } => {
                write!(f, "expected at least {} fields, found {}", MIN_FIELDS, found)
            }
            Rejection::InvalidPrice { value } => write!(f, "invalid price '{}'", value),
        }
    }
}

/// A data row that did not pass validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based index among the data rows (header excluded).
    pub row: usize,
    pub reason: Rejection,
}

/// Accepted candidates plus the rows that were dropped.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<CandidateRecord>,
    pub skipped: Vec<SkippedRow>,
}

impl ValidationOutcome {
    pub fn rejected_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Parse a price written in plain decimal notation.
///
/// Accepts `12`, `-3.5`, `+0.75`, `.5`, `5.`; rejects anything else.
///
/// Fractional digits beyond what [`Decimal`] holds are rounded away. A
/// value too large for [`Decimal`] saturates to [`Decimal::MAX`] or
/// [`Decimal::MIN`], so it is still a number and fails at the store like any
/// other price too large for the column.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let captures = DECIMAL_PATTERN.captures(raw)?;
    let negative = captures.get(1).map_or("", |m| m.as_str()) == "-";
    let integer = captures.get(2).map_or("", |m| m.as_str());
    let fraction = captures.get(3).map_or("", |m| m.as_str());

    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let integer = integer.trim_start_matches('0');
    let mut normalized = String::with_capacity(raw.len() + 1);
    if negative {
        normalized.push('-');
    }
    normalized.push_str(if integer.is_empty() { "0" } else { integer });
    if !fraction.is_empty() {
        normalized.push('.');
        normalized.push_str(fraction);
    }

    match Decimal::from_str(&normalized) {
        Ok(price) => Some(price),
        // The pattern already matched, so the only failure left is overflow.
        Err(_) if negative => Some(Decimal::MIN),
        Err(_) => Some(Decimal::MAX),
    }
}

/// Validate a single row.
pub fn validate_row(row: &Row) -> Result<CandidateRecord, Rejection> {
    if row.len() < MIN_FIELDS {
        return Err(Rejection::TooFewFields { found: row.len() });
    }

    let price = parse_price(&row[PRICE]).ok_or_else(|| Rejection::InvalidPrice {
        value: row[PRICE].clone(),
    })?;

    Ok(CandidateRecord {
        name: row[NAME].clone(),
        category: row[CATEGORY].clone(),
        price,
        create_date: row[CREATE_DATE].clone(),
    })
}

/// Validate every data row, keeping the original order of accepted rows.
pub fn validate_rows(rows: &[Row]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    for (index, row) in rows.iter().enumerate() {
        match validate_row(row) {
            Ok(candidate) => outcome.accepted.push(candidate),
            Err(reason) => outcome.skipped.push(SkippedRow { row: index, reason }),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|s| s.to_string()).collect()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_price_accepts_plain_decimals() {
        assert_eq!(parse_price("1.50"), Some(dec("1.50")));
        assert_eq!(parse_price("12"), Some(dec("12")));
        assert_eq!(parse_price("-3.5"), Some(dec("-3.5")));
        assert_eq!(parse_price("+0.75"), Some(dec("0.75")));
        assert_eq!(parse_price(".5"), Some(dec("0.5")));
        assert_eq!(parse_price("5."), Some(dec("5")));
    }

    #[test]
    fn test_parse_price_rejects_non_decimals() {
        for raw in ["", "notanumber", "1e3", "NaN", "inf", " 1.5", "1.5 ", "1,50", ".", "-", "1_000", "١٢"] {
            assert_eq!(parse_price(raw), None, "expected '{}' to be rejected", raw);
        }
    }

    #[test]
    fn test_parse_price_long_fraction_is_rounded() {
        assert_eq!(parse_price("0.1000000000000000000000000000001"), Some(dec("0.1")));
        assert_eq!(parse_price("1.00000000000000000000000000000000000009"), Some(dec("1")));
    }

    #[test]
    fn test_parse_price_huge_values_saturate() {
        assert_eq!(parse_price("999999999999999999999999999999999"), Some(Decimal::MAX));
        assert_eq!(parse_price("-999999999999999999999999999999999"), Some(Decimal::MIN));
        assert_eq!(parse_price("100000000000"), Some(dec("100000000000")));
    }

    #[test]
    fn test_parse_price_leading_zeros() {
        assert_eq!(parse_price("0000000000000000000000000000000000042.5"), Some(dec("42.5")));
        assert_eq!(parse_price("-000"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_valid_row() {
        let candidate = validate_row(&row(&["1", "Apple", "Fruit", "1.50", "2024-01-01"])).unwrap();

        assert_eq!(candidate.name, "Apple");
        assert_eq!(candidate.category, "Fruit");
        assert_eq!(candidate.price, dec("1.50"));
        assert_eq!(candidate.create_date, "2024-01-01");
    }

    #[test]
    fn test_extra_fields_ignored() {
        let candidate = validate_row(&row(&["x", "A", "B", "2", "d", "extra", "more"])).unwrap();
        assert_eq!(candidate.create_date, "d");
    }

    #[test]
    fn test_id_and_date_not_checked() {
        let candidate = validate_row(&row(&["not-an-id", "", "", "0", "bad-date-ok"])).unwrap();
        assert_eq!(candidate.name, "");
        assert_eq!(candidate.create_date, "bad-date-ok");
    }

    #[test]
    fn test_too_few_fields() {
        let err = validate_row(&row(&["1", "Apple", "Fruit", "1.50"])).unwrap_err();
        assert_eq!(err, Rejection::TooFewFields { found: 4 });
    }

    #[test]
    fn test_field_count_checked_before_price() {
        let err = validate_row(&row(&["1", "x", "y", "bad"])).unwrap_err();
        assert!(matches!(err, Rejection::TooFewFields { .. }));
    }

    #[test]
    fn test_invalid_price() {
        let err = validate_row(&row(&["4", "Bad", "Oops", "notanumber", "2024-01-03"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid price 'notanumber'");
    }

    #[test]
    fn test_validate_rows_keeps_order_and_counts_skips() {
        let rows = vec![
            row(&["1", "Apple", "Fruit", "1.50", "2024-01-01"]),
            row(&["2", "Short"]),
            row(&["3", "Widget", "Hardware", "9.99", "bad-date-ok"]),
            row(&["4", "Bad", "Oops", "notanumber", "2024-01-03"]),
        ];

        let outcome = validate_rows(&rows);

        let names: Vec<&str> = outcome.accepted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Widget"]);
        assert_eq!(outcome.rejected_count(), 2);
        assert_eq!(outcome.skipped[0].row, 1);
        assert_eq!(outcome.skipped[1].row, 3);
    }
}
