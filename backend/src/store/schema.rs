//! Table layout for stored prices.
//!
//! The DDL is applied by [`super::PostgresStore::ensure_schema`]; the column
//! limits are also enforced by [`super::MemoryStore`] so both backends reject
//! the same rows.

use rust_decimal::Decimal;

/// Name of the table holding stored prices.
pub const TABLE_NAME: &str = "prices";

/// Maximum characters in `name` and `category` (`VARCHAR(255)`).
pub const MAX_TEXT_LEN: usize = 255;

/// Fractional digits kept for `price` (`NUMERIC(12, 2)`).
pub const PRICE_SCALE: u32 = 2;

/// Integer digits allowed for `price` (`NUMERIC(12, 2)`).
pub const PRICE_INTEGER_DIGITS: u32 = 10;

/// `CREATE TABLE` statement, idempotent.
pub fn create_table_sql() -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR({text}) NOT NULL,
    category VARCHAR({text}) NOT NULL,
    price NUMERIC({precision}, {scale}) NOT NULL,
    create_date TEXT NOT NULL
)"#,
        table = TABLE_NAME,
        text = MAX_TEXT_LEN,
        precision = PRICE_INTEGER_DIGITS + PRICE_SCALE,
        scale = PRICE_SCALE,
    )
}

/// Insert one record; the id comes from the sequence.
pub fn insert_sql() -> String {
    format!(
        "INSERT INTO {} (name, category, price, create_date) VALUES ($1, $2, $3, $4)",
        TABLE_NAME
    )
}

/// Whole-table totals: row count, distinct categories, price sum.
pub fn aggregate_sql() -> String {
    format!(
        "SELECT COUNT(*), COUNT(DISTINCT category), COALESCE(SUM(price), 0) FROM {}",
        TABLE_NAME
    )
}

/// Every record, oldest first.
pub fn select_all_sql() -> String {
    format!(
        "SELECT id, name, category, price, create_date FROM {} ORDER BY id",
        TABLE_NAME
    )
}

/// Round a price the way `NUMERIC(12, 2)` stores it, or `None` if it does
/// not fit the column.
pub fn fit_price(price: Decimal) -> Option<Decimal> {
    let rounded = price.round_dp_with_strategy(
        PRICE_SCALE,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    );
    let limit = Decimal::from(10_i64.pow(PRICE_INTEGER_DIGITS));

    if rounded.abs() < limit {
        Some(rounded)
    } else {
        None
    }
}
