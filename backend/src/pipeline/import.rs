//! Import pipeline: zipped CSV upload to stored rows and fresh totals.

use std::sync::Arc;

use crate::api::logs::RequestLog;
use crate::archive;
use crate::error::PipelineResult;
use crate::models::AggregateResult;
use crate::parser;
use crate::store::PriceStore;
use crate::validation;

/// What an import did. Only `totals` is sent back to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Whole-table totals after the import committed.
    pub totals: AggregateResult,
    /// Rows inserted by this import.
    pub accepted: usize,
    /// Rows skipped by validation.
    pub rejected: usize,
}

/// Runs uploads through extraction, parsing, validation and storage.
#[derive(Clone)]
pub struct ImportPipeline {
    store: Arc<dyn PriceStore>,
}

impl ImportPipeline {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    /// Import one zip upload.
    ///
    /// Any stage failure ends the import with nothing stored. Rows that fail
    /// validation are skipped; even when every row is skipped the store is
    /// still asked for its totals.
    pub async fn run(&self, archive_bytes: &[u8], log: &RequestLog) -> PipelineResult<ImportSummary> {
        log.info(format!("📦 Opening archive ({} bytes)...", archive_bytes.len()));
        let member = archive::extract(archive_bytes)?;
        log.success(format!("Found {} ({} bytes)", member.name, member.bytes.len()));

        log.info("📖 Reading CSV...");
        let rows = parser::parse_rows(&member.bytes)?;
        log.success(format!("Read {} data rows", rows.len()));

        log.info("✔️  Validating rows...");
        let outcome = validation::validate_rows(&rows);
        let accepted = outcome.accepted.len();
        let rejected = outcome.rejected_count();
        if rejected > 0 {
            log.warning(format!("{} rows skipped", rejected));
            for skipped in outcome.skipped.iter().take(5) {
                log.warning(format!("• row {}: {}", skipped.row + 1, skipped.reason));
            }
        }
        log.success(format!("{} rows accepted", accepted));

        log.info("💾 Storing rows...");
        let totals = self.store.import_batch(&outcome.accepted).await?;
        log.success(format!(
            "Totals: {} items, {} categories, price {}",
            totals.total_items,
            totals.total_categories,
            parser::format_price(totals.total_price)
        ));

        Ok(ImportSummary { totals, accepted, rejected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_with;
    use crate::error::{ErrorKind, PipelineError};
    use crate::pipeline::test_support::SpyStore;
    use crate::store::MemoryStore;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const SAMPLE: &str = "id,name,category,price,create_date\n\
                          1,Apple,Fruit,1.50,2024-01-01\n\
                          2,Banana,Fruit,0.75,2024-01-02\n\
                          3,Widget,Hardware,9.99,bad-date-ok\n\
                          4,Bad,Oops,notanumber,2024-01-03\n";

    fn pipeline_with(store: Arc<dyn PriceStore>) -> ImportPipeline {
        ImportPipeline::new(store)
    }

    #[tokio::test]
    async fn test_sample_import() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(store.clone());

        let summary = pipeline
            .run(&zip_with(&[("data.csv", SAMPLE.as_bytes())]), &RequestLog::start())
            .await
            .unwrap();

        assert_eq!(summary.totals.total_items, 3);
        assert_eq!(summary.totals.total_categories, 2);
        assert_eq!(summary.totals.total_price, Decimal::from_str("12.24").unwrap());
        assert_eq!(summary.accepted, 3);
        assert_eq!(summary.rejected, 1);

        let stored = store.fetch_all().await.unwrap();
        assert_eq!(stored[2].name, "Widget");
        assert_eq!(stored[2].create_date, "bad-date-ok");
        assert!(stored.iter().all(|r| r.name != "Bad"));
    }

    #[tokio::test]
    async fn test_totals_accumulate_across_imports() {
        let pipeline = pipeline_with(Arc::new(MemoryStore::new()));
        let log = RequestLog::start();

        pipeline.run(&zip_with(&[("data.csv", SAMPLE.as_bytes())]), &log).await.unwrap();
        let second = "id,name,category,price,create_date\n\
                      9,Hammer,Tools,20.00,2024-02-01\n\
                      10,Grape,Fruit,3.01,2024-02-02\n";
        let summary = pipeline
            .run(&zip_with(&[("data.csv", second.as_bytes())]), &log)
            .await
            .unwrap();

        assert_eq!(summary.totals.total_items, 5);
        assert_eq!(summary.totals.total_categories, 3);
        assert_eq!(summary.totals.total_price, Decimal::from_str("35.25").unwrap());
    }

    #[tokio::test]
    async fn test_all_rows_rejected_still_reports_totals() {
        let store = Arc::new(SpyStore::default());
        let pipeline = pipeline_with(store.clone());
        let log = RequestLog::start();

        pipeline.run(&zip_with(&[("data.csv", SAMPLE.as_bytes())]), &log).await.unwrap();
        let junk = "h\n1,short\n2,a,b,NaN,d\n";
        let summary = pipeline
            .run(&zip_with(&[("data.csv", junk.as_bytes())]), &log)
            .await
            .unwrap();

        assert_eq!(store.imports(), 2);
        assert_eq!(summary.accepted, 0);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.totals.total_items, 3);
    }

    #[tokio::test]
    async fn test_header_only_never_reaches_store() {
        let store = Arc::new(SpyStore::default());
        let pipeline = pipeline_with(store.clone());

        let err = pipeline
            .run(&zip_with(&[("data.csv", b"id,name,category,price,create_date\n")]), &RequestLog::start())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EmptyDataset);
        assert_eq!(store.imports(), 0);
    }

    #[tokio::test]
    async fn test_stage_failures_map_to_kinds() {
        let store = Arc::new(SpyStore::default());
        let pipeline = pipeline_with(store.clone());
        let log = RequestLog::start();

        let not_zip = pipeline.run(b"plain text", &log).await.unwrap_err();
        assert_eq!(not_zip.kind(), ErrorKind::Format);

        let no_csv = pipeline.run(&zip_with(&[("notes.txt", b"x")]), &log).await.unwrap_err();
        assert_eq!(no_csv.kind(), ErrorKind::NotFound);

        let bad_utf8 = pipeline
            .run(&zip_with(&[("data.csv", b"h\n1,\xff,c,1,d\n")]), &log)
            .await
            .unwrap_err();
        assert_eq!(bad_utf8.kind(), ErrorKind::Format);

        assert_eq!(store.imports(), 0);
    }

    #[tokio::test]
    async fn test_broken_quoting_is_format_error() {
        let store = Arc::new(SpyStore::default());
        let pipeline = pipeline_with(store.clone());
        let log = RequestLog::start();

        let unterminated = "id,name,category,price,create_date\n\
                            1,\"Apple,Fruit,1.50,2024-01-01\n\
                            2,Pear,Fruit,2.00,2024-01-02\n";
        let bare = "id,name,category,price,create_date\n\
                    1,Ap\"ple,Fruit,1.50,2024-01-01\n\
                    2,Pear,Fruit,2.00,2024-01-02\n";

        for csv in [unterminated, bare] {
            let err = pipeline
                .run(&zip_with(&[("data.csv", csv.as_bytes())]), &log)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format);
        }

        assert_eq!(store.imports(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_persistence_error() {
        let pipeline = pipeline_with(Arc::new(SpyStore::failing()));

        let err = pipeline
            .run(&zip_with(&[("data.csv", SAMPLE.as_bytes())]), &RequestLog::start())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Store(_)));
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }

    #[tokio::test]
    async fn test_prices_out_of_column_range_fail_alike() {
        for price in ["100000000000", "99999999999999999999999999999999999999"] {
            let store = Arc::new(MemoryStore::new());
            let pipeline = pipeline_with(store.clone());
            let csv = format!("id,name,category,price,create_date\n1,Ok,Fruit,1.00,d\n2,Big,Fruit,{},d\n", price);

            let err = pipeline
                .run(&zip_with(&[("data.csv", csv.as_bytes())]), &RequestLog::start())
                .await
                .unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Persistence, "price {}", price);
            assert!(store.fetch_all().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_constraint_violation_rolls_back_batch() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = pipeline_with(store.clone());
        let csv = format!(
            "id,name,category,price,create_date\n1,Ok,Fruit,1.00,d\n2,{},Fruit,2.00,d\n",
            "n".repeat(300)
        );

        let err = pipeline
            .run(&zip_with(&[("data.csv", csv.as_bytes())]), &RequestLog::start())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(store.fetch_all().await.unwrap().is_empty());
    }
}
