//! Export pipeline: every stored row back out as a zipped CSV.

use std::sync::Arc;

use crate::api::logs::RequestLog;
use crate::archive;
use crate::error::PipelineResult;
use crate::parser;
use crate::store::PriceStore;

/// A built export.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    /// Zip container bytes.
    pub bytes: Vec<u8>,
    /// Number of data rows in the CSV.
    pub record_count: usize,
}

/// Reads the whole table and packages it as `data.csv` inside a zip.
#[derive(Clone)]
pub struct ExportPipeline {
    store: Arc<dyn PriceStore>,
}

impl ExportPipeline {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self { store }
    }

    pub async fn run(&self, log: &RequestLog) -> PipelineResult<ExportArchive> {
        log.info("📤 Exporting stored prices...");
        let records = self.store.fetch_all().await?;

        let csv = parser::write_records(&records)?;
        let bytes = archive::package(&csv)?;
        log.success(format!("Exported {} rows ({} bytes zipped)", records.len(), bytes.len()));

        Ok(ExportArchive {
            bytes,
            record_count: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::tests::zip_with;
    use crate::pipeline::ImportPipeline;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_export_empty_store() {
        let pipeline = ExportPipeline::new(Arc::new(MemoryStore::new()));
        let export = pipeline.run(&RequestLog::start()).await.unwrap();

        assert_eq!(export.record_count, 0);
        let member = archive::extract(&export.bytes).unwrap();
        assert_eq!(member.name, archive::MEMBER_NAME);
        assert_eq!(member.bytes, b"id,name,category,price,create_date\n");
    }

    #[tokio::test]
    async fn test_import_then_export_round_trip() {
        let store: Arc<dyn PriceStore> = Arc::new(MemoryStore::new());
        let log = RequestLog::start();
        let upload = "id,name,category,price,create_date\n\
                      17,Apple,Fruit,1.5,2024-01-01\n\
                      3,\"Nuts, mixed\",Snacks,4,2024-01-05\n\
                      8,Broken,Fruit,n/a,2024-01-06\n\
                      9,Widget,Hardware,9.99,bad-date-ok\n";

        ImportPipeline::new(store.clone())
            .run(&zip_with(&[("upload.csv", upload.as_bytes())]), &log)
            .await
            .unwrap();
        let export = ExportPipeline::new(store).run(&log).await.unwrap();

        let member = archive::extract(&export.bytes).unwrap();
        let rows = parser::parse_rows(&member.bytes).unwrap();

        assert_eq!(export.record_count, 3);
        assert_eq!(
            rows,
            vec![
                vec!["1", "Apple", "Fruit", "1.50", "2024-01-01"],
                vec!["2", "Nuts, mixed", "Snacks", "4.00", "2024-01-05"],
                vec!["3", "Widget", "Hardware", "9.99", "bad-date-ok"],
            ]
        );
    }
}
