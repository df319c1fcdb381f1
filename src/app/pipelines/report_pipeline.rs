use crate::core::chart::render_svg;
use crate::core::export::export_csv;
use crate::core::query::count_by;
use crate::core::{Pipeline, Record, RecordSource, ReportResult, ReportSettings, Storage};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const CHART_HEIGHT: f64 = 200.0;

/// Fetches claims, runs the configured query and writes the CSV export,
/// optionally bundled with a status summary and its chart.
pub struct ReportPipeline<S: Storage, R: RecordSource, C: ReportSettings> {
    pub(crate) storage: S,
    pub(crate) source: R,
    pub(crate) config: C,
}

#[derive(Serialize)]
struct Summary<'a> {
    matched_records: usize,
    page: usize,
    total_pages: usize,
    field: Option<&'a str>,
    groups: &'a [crate::core::ChartDatum],
}

impl<S: Storage, R: RecordSource, C: ReportSettings> ReportPipeline<S, R, C> {
    pub fn new(storage: S, source: R, config: C) -> Self {
        Self {
            storage,
            source,
            config,
        }
    }

    fn bundle_bytes(&self, result: &ReportResult, csv_name: &str) -> Result<Vec<u8>> {
        let summary = Summary {
            matched_records: result.matched_records.len(),
            page: result.page.index,
            total_pages: result.page.total_pages,
            field: self.config.summary_field(),
            groups: &result.summary,
        };
        let svg = render_svg(self.config.summary_chart(), &result.summary, CHART_HEIGHT);

        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>(csv_name, FileOptions::default())?;
        zip.write_all(result.csv_output.as_bytes())?;

        zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
        zip.write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;

        zip.start_file::<_, ()>("summary.svg", FileOptions::default())?;
        zip.write_all(svg.as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, R: RecordSource, C: ReportSettings> Pipeline for ReportPipeline<S, R, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        let records = self.source.fetch().await?;
        if records.is_empty() {
            tracing::warn!("Source returned no records");
        }
        Ok(records)
    }

    async fn transform(&self, data: Vec<Record>) -> Result<ReportResult> {
        let query = self.config.query();
        let matched_records = query.select(&data);
        let page = query.page.slice(matched_records.clone());
        let csv_output = export_csv(&matched_records, &self.config.export_columns())?;
        let summary = self
            .config
            .summary_field()
            .map(|field| count_by(&matched_records, field))
            .unwrap_or_default();

        Ok(ReportResult {
            page,
            matched_records,
            csv_output,
            summary,
        })
    }

    async fn load(&self, result: ReportResult) -> Result<String> {
        let csv_name = format!("{}.csv", self.config.export_filename());

        let (file_name, data) = if self.config.bundle() {
            let zip_data = self.bundle_bytes(&result, &csv_name)?;
            tracing::debug!("Writing ZIP bundle ({} bytes) to storage", zip_data.len());
            (format!("{}.zip", self.config.export_filename()), zip_data)
        } else {
            (csv_name, result.csv_output.into_bytes())
        };

        self.storage.write_file(&file_name, &data).await?;
        Ok(format!("{}/{}", self.config.output_path(), file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticSource;
    use crate::adapters::sample_claims;
    use crate::core::chart::ChartKind;
    use crate::core::export::{claim_columns, ExportColumn};
    use crate::core::query::{FilterSet, PageRequest, Query};
    use crate::utils::error::FraError;
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                FraError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn remove_file(&self, path: &str) -> Result<()> {
            self.files.lock().await.remove(path);
            Ok(())
        }
    }

    struct MockSettings {
        query: Query,
        bundle: bool,
    }

    impl ReportSettings for MockSettings {
        fn query(&self) -> Query {
            self.query.clone()
        }

        fn export_columns(&self) -> Vec<ExportColumn> {
            claim_columns()
        }

        fn output_path(&self) -> &str {
            "./test_output"
        }

        fn export_filename(&self) -> &str {
            "claims"
        }

        fn summary_field(&self) -> Option<&str> {
            Some("status")
        }

        fn summary_chart(&self) -> ChartKind {
            ChartKind::Pie
        }

        fn bundle(&self) -> bool {
            self.bundle
        }
    }

    fn pipeline(query: Query, bundle: bool) -> ReportPipeline<MockStorage, StaticSource, MockSettings> {
        ReportPipeline::new(
            MockStorage::default(),
            StaticSource::sample(),
            MockSettings { query, bundle },
        )
    }

    #[tokio::test]
    async fn test_transform_exports_all_matches_but_pages_view() {
        let query = Query::new(FilterSet::new().with_exact("village", "Village A"))
            .paged(PageRequest::new(0, 1));
        let pipeline = pipeline(query, false);

        let result = pipeline.transform(sample_claims()).await.unwrap();
        assert_eq!(result.matched_records.len(), 2);
        assert_eq!(result.page.items.len(), 1);
        assert_eq!(result.page.total_pages, 2);
        assert_eq!(result.csv_output.lines().count(), 3);
        assert_eq!(result.summary.len(), 1);
        assert_eq!(result.summary[0].label, "Approved");
        assert_eq!(result.summary[0].value, 2.0);
    }

    #[tokio::test]
    async fn test_load_writes_csv() {
        let pipeline = pipeline(Query::default(), false);
        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();
        let path = pipeline.load(result).await.unwrap();

        assert_eq!(path, "./test_output/claims.csv");
        let csv = pipeline.storage.read_file("claims.csv").await.unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert!(csv.starts_with("ID,Holder,Village"));
        assert!(csv.contains(r#""4","Maya Bai","Village C","Kanker""#));
    }

    #[tokio::test]
    async fn test_load_bundles_summary() {
        let pipeline = pipeline(Query::default(), true);
        let result = pipeline.transform(sample_claims()).await.unwrap();
        let path = pipeline.load(result).await.unwrap();
        assert_eq!(path, "./test_output/claims.zip");

        let bytes = pipeline.storage.read_file("claims.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        let mut summary = String::new();
        archive
            .by_name("summary.json")
            .unwrap()
            .read_to_string(&mut summary)
            .unwrap();
        let summary: serde_json::Value = serde_json::from_str(&summary).unwrap();
        assert_eq!(summary["matched_records"], 5);
        assert_eq!(summary["groups"].as_array().unwrap().len(), 4);

        let mut svg = String::new();
        archive
            .by_name("summary.svg")
            .unwrap()
            .read_to_string(&mut svg)
            .unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(archive.by_name("claims.csv").is_ok());
    }
}
