use crate::adapters::SourceSpec;
use crate::core::chart::ChartKind;
use crate::core::export::{claim_columns, ExportColumn};
use crate::core::query::{DateWindow, FilterSet, PageRequest, Query, SortSpec, TextSearch};
use crate::core::ReportSettings;
use crate::utils::error::{FraError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "fra-monitor")]
#[command(about = "Filter FRA claims and export them as CSV with a status summary")]
pub struct CliConfig {
    #[arg(long, default_value = "sample", help = "'sample', a JSON file path or an http(s) URL")]
    pub source: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "fra_claims")]
    pub filename: String,

    #[arg(long, default_value = "")]
    pub state: String,

    #[arg(long, default_value = "")]
    pub district: String,

    #[arg(long, default_value = "")]
    pub village: String,

    #[arg(long, default_value = "")]
    pub status: String,

    #[arg(long, default_value = "")]
    pub tribe: String,

    #[arg(long, default_value = "")]
    pub search: String,

    #[arg(long, value_delimiter = ',', default_value = "id,holder,village")]
    pub search_fields: Vec<String>,

    #[arg(long, help = "Keep records dated within the last N days")]
    pub last_days: Option<u32>,

    #[arg(long, default_value = "date")]
    pub date_field: String,

    #[arg(long, help = "Sort as key,direction e.g. date,descending")]
    pub sort: Option<SortSpec>,

    #[arg(long, default_value = "0")]
    pub page: usize,

    #[arg(long, default_value = "0", help = "Rows per page, 0 for a single page")]
    pub page_size: usize,

    #[arg(long, default_value = "status")]
    pub summary_field: String,

    #[arg(long, default_value = "pie")]
    pub chart: ChartKind,

    #[arg(long, help = "Write a zip bundle with the CSV, summary JSON and chart")]
    pub bundle: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log system resource usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit JSON log lines")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn source_spec(&self) -> SourceSpec {
        SourceSpec::parse(&self.source)
    }

    pub fn filters(&self) -> FilterSet {
        let mut filters = FilterSet::new()
            .with_exact("state", self.state.as_str())
            .with_exact("district", self.district.as_str())
            .with_exact("village", self.village.as_str())
            .with_exact("status", self.status.as_str())
            .with_exact("tribe", self.tribe.as_str());
        if !self.search.is_empty() {
            filters = filters.with_search(TextSearch {
                term: self.search.clone(),
                fields: self.search_fields.clone(),
            });
        }
        if let Some(days) = self.last_days {
            filters = filters.with_date_window(DateWindow {
                field: self.date_field.clone(),
                days,
                reference: chrono::Local::now().date_naive(),
            });
        }
        filters
    }
}

impl ReportSettings for CliConfig {
    fn query(&self) -> Query {
        let mut query =
            Query::new(self.filters()).paged(PageRequest::new(self.page, self.page_size));
        if let Some(sort) = &self.sort {
            query = query.sorted_by(sort.clone());
        }
        query
    }

    fn export_columns(&self) -> Vec<ExportColumn> {
        claim_columns()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn export_filename(&self) -> &str {
        &self.filename
    }

    fn summary_field(&self) -> Option<&str> {
        Some(self.summary_field.as_str()).filter(|f| !f.is_empty())
    }

    fn summary_chart(&self) -> ChartKind {
        self.chart
    }

    fn bundle(&self) -> bool {
        self.bundle
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_non_empty_string("filename", &self.filename)?;
        let search = TextSearch {
            term: self.search.clone(),
            fields: self.search_fields.clone(),
        };
        if search.is_unsearchable() {
            return Err(FraError::ConfigValidationError {
                field: "search_fields".to_string(),
                message: "A search term needs at least one field to search".to_string(),
            });
        }
        match self.source_spec() {
            SourceSpec::Api { endpoint, .. } => validation::validate_url("source", &endpoint)?,
            SourceSpec::File(path) => {
                validation::validate_file_extension("source", &path, &["json", "geojson"])?
            }
            SourceSpec::Sample => {}
        }
        Ok(())
    }
}
