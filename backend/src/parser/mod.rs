//! CSV codec for price lists.
//!
//! Parsing turns raw bytes into rows of string fields (the header row is
//! dropped); writing turns stored records back into CSV with a fixed
//! five-column layout.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CsvError, CsvResult};
use crate::models::PersistedRecord;

/// One CSV line as raw fields, in column order.
pub type Row = Vec<String>;

/// Column layout of exported files.
pub const EXPORT_HEADER: [&str; 5] = ["id", "name", "category", "price", "create_date"];

/// Where the quote scanner is inside the current field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    /// Saw a `"` inside a quoted field: either an escaped quote or the end.
    QuoteInQuoted,
    /// After the closing quote and a `\r`; only a line end or `,` may follow.
    Closed,
}

/// Check the quoting of the whole input.
///
/// The `csv` reader accepts broken quoting and silently merges or splits
/// fields, so this rejects the three cases it lets through: a `"` inside an
/// unquoted field, anything but a separator after a closing quote, and a
/// quoted field still open at the end of the input.
fn check_quoting(bytes: &[u8]) -> CsvResult<()> {
    let mut state = QuoteState::FieldStart;
    let mut line: u64 = 1;
    let mut quote_opened_at: u64 = 1;

    for &byte in bytes {
        state = match (state, byte) {
            (QuoteState::Quoted, b'"') => QuoteState::QuoteInQuoted,
            (QuoteState::Quoted, _) => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted, b'"') => QuoteState::Quoted,
            (QuoteState::QuoteInQuoted | QuoteState::Closed, b'\r') => QuoteState::Closed,
            (QuoteState::QuoteInQuoted | QuoteState::Closed, b',' | b'\n') => QuoteState::FieldStart,
            (QuoteState::QuoteInQuoted | QuoteState::Closed, _) => {
                return Err(CsvError::malformed(line, "extraneous or missing \" in quoted field"));
            }
            (QuoteState::FieldStart, b'"') => {
                quote_opened_at = line;
                QuoteState::Quoted
            }
            (QuoteState::Unquoted, b'"') => {
                return Err(CsvError::malformed(line, "bare \" in non-quoted field"));
            }
            (_, b',' | b'\n') => QuoteState::FieldStart,
            (_, _) => QuoteState::Unquoted,
        };

        if byte == b'\n' {
            line += 1;
        }
    }

    if state == QuoteState::Quoted {
        return Err(CsvError::malformed(quote_opened_at, "quoted field is never closed"));
    }

    Ok(())
}

/// Parse CSV bytes into data rows.
///
/// The first record is the header and is discarded without being decoded,
/// so a header that is not UTF-8 never fails the parse. Quoting is checked
/// over the whole input, header included, since a broken quote moves every
/// record boundary after it. Rows may have different field counts; blank
/// lines are skipped.
///
/// # Errors
/// - [`CsvError::Malformed`] if the quoting is broken or a data row is not UTF-8
/// - [`CsvError::EmptyDataset`] if there is no data row after the header
///
/// # Example
/// ```ignore
/// let rows = parse_rows(b"id,name\n1,Apple\n")?;
/// assert_eq!(rows, vec![vec!["1".to_string(), "Apple".to_string()]]);
/// ```
pub fn parse_rows(bytes: &[u8]) -> CsvResult<Vec<Row>> {
    check_quoting(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    let mut header_seen = false;

    for result in reader.byte_records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            CsvError::malformed(line, e.to_string())
        })?;

        if !header_seen {
            header_seen = true;
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row = record
            .iter()
            .map(|field| {
                std::str::from_utf8(field)
                    .map(str::to_string)
                    .map_err(|e| CsvError::malformed(line, format!("invalid UTF-8: {}", e)))
            })
            .collect::<CsvResult<Row>>()?;

        rows.push(row);
    }

    if rows.is_empty() {
        return Err(CsvError::EmptyDataset);
    }

    Ok(rows)
}

/// Render a price with exactly two fractional digits.
pub fn format_price(price: Decimal) -> String {
    let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // Avoid printing "-0.00" for tiny negative values.
    let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
    format!("{:.2}", rounded)
}

/// Serialize records as CSV, in the order given, under [`EXPORT_HEADER`].
pub fn write_records(records: &[PersistedRecord]) -> CsvResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADER)
        .map_err(|e| CsvError::Write(e.to_string()))?;

    for record in records {
        let id = record.id.to_string();
        let price = format_price(record.price);
        writer
            .write_record([
                id.as_str(),
                record.name.as_str(),
                record.category.as_str(),
                price.as_str(),
                record.create_date.as_str(),
            ])
            .map_err(|e| CsvError::Write(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| CsvError::Write(e.to_string()))
}
