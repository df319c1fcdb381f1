use crate::adapters::SourceSpec;
use crate::core::chart::ChartKind;
use crate::core::export::{claim_columns, ExportColumn};
use crate::core::query::{DateWindow, FilterSet, PageRequest, Query, SortSpec, TextSearch};
use crate::core::session::UserEntry;
use crate::core::ReportSettings;
use crate::utils::error::{FraError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern must compile"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub report: ReportInfo,
    pub source: SourceConfig,
    #[serde(default)]
    pub query: QueryConfig,
    pub export: ExportConfig,
    pub chart: Option<ChartConfig>,
    pub monitoring: Option<MonitoringConfig>,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

/// `type` is one of `sample`, `file` or `api`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: String,
    pub path: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    pub search: Option<TextSearch>,
    pub last_days: Option<u32>,
    pub date_field: Option<String>,
    /// Fixed end of the date window (`YYYY-MM-DD`); today when absent.
    pub reference_date: Option<chrono::NaiveDate>,
    pub sort: Option<SortSpec>,
    pub page: Option<PageRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: String,
    pub filename: Option<String>,
    pub columns: Option<Vec<ExportColumn>>,
    pub bundle: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    pub summary_field: Option<String>,
    pub kind: Option<ChartKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub log_json: Option<bool>,
}

impl ReportConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FraError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| FraError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn source_spec(&self) -> Result<SourceSpec> {
        match self.source.r#type.as_str() {
            "sample" => Ok(SourceSpec::Sample),
            "file" => {
                let path = validation::validate_required_field("source.path", &self.source.path)?;
                Ok(SourceSpec::File(path.clone()))
            }
            "api" => {
                let endpoint =
                    validation::validate_required_field("source.endpoint", &self.source.endpoint)?;
                Ok(SourceSpec::Api {
                    endpoint: endpoint.clone(),
                    timeout: self.source.timeout_seconds.map(Duration::from_secs),
                    headers: self.source.headers.clone().unwrap_or_default(),
                })
            }
            other => Err(FraError::InvalidConfigValueError {
                field: "source.type".to_string(),
                value: other.to_string(),
                reason: "Valid types: sample, file, api".to_string(),
            }),
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("report.name", &self.report.name)?;
        validation::validate_path("export.output_path", &self.export.output_path)?;

        match self.source_spec()? {
            SourceSpec::Api { endpoint, .. } => {
                validation::validate_url("source.endpoint", &endpoint)?
            }
            SourceSpec::File(path) => {
                validation::validate_file_extension("source.path", &path, &["json", "geojson"])?
            }
            SourceSpec::Sample => {}
        }

        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_range("source.timeout_seconds", timeout, 1, 300)?;
        }
        if let Some(days) = self.query.last_days {
            validation::validate_positive_number("query.last_days", days as usize, 1)?;
        }
        if self.query.search.as_ref().is_some_and(TextSearch::is_unsearchable) {
            return Err(FraError::ConfigValidationError {
                field: "query.search.fields".to_string(),
                message: "A search term needs at least one field to search".to_string(),
            });
        }
        if let Some(columns) = &self.export.columns {
            if columns.is_empty() {
                return Err(FraError::ConfigValidationError {
                    field: "export.columns".to_string(),
                    message: "At least one column is required".to_string(),
                });
            }
        }
        for (index, user) in self.users.iter().enumerate() {
            validation::validate_non_empty_string(
                &format!("users[{}].username", index),
                &user.username,
            )?;
        }

        Ok(())
    }

    pub fn filters(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        for (field, value) in &self.query.filters {
            filters.set(field, value.as_str());
        }
        if let Some(search) = &self.query.search {
            filters = filters.with_search(search.clone());
        }
        if let Some(days) = self.query.last_days {
            filters = filters.with_date_window(DateWindow {
                field: self.query.date_field.clone().unwrap_or_else(|| "date".to_string()),
                days,
                reference: self
                    .query
                    .reference_date
                    .unwrap_or_else(|| chrono::Local::now().date_naive()),
            });
        }
        filters
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_json(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_json)
            .unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_level.as_deref())
            .is_some_and(|level| level.eq_ignore_ascii_case("debug"))
    }

    pub fn requires_login(&self) -> bool {
        !self.users.is_empty()
    }
}

impl ReportSettings for ReportConfig {
    fn query(&self) -> Query {
        let mut query = Query::new(self.filters()).paged(self.query.page.unwrap_or_default());
        if let Some(sort) = &self.query.sort {
            query = query.sorted_by(sort.clone());
        }
        query
    }

    fn export_columns(&self) -> Vec<ExportColumn> {
        self.export.columns.clone().unwrap_or_else(claim_columns)
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn export_filename(&self) -> &str {
        self.export.filename.as_deref().unwrap_or("fra_claims")
    }

    fn summary_field(&self) -> Option<&str> {
        match &self.chart {
            Some(chart) => chart.summary_field.as_deref().filter(|f| !f.is_empty()),
            None => Some("status"),
        }
    }

    fn summary_chart(&self) -> ChartKind {
        self.chart.as_ref().and_then(|c| c.kind).unwrap_or_default()
    }

    fn bundle(&self) -> bool {
        self.export.bundle.unwrap_or(false)
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
