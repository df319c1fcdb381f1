use crate::core::chart::ChartKind;
use crate::core::export::ExportColumn;
use crate::core::query::Query;
use crate::domain::model::{Record, ReportResult, Session};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Where claim/report rows come from: literals, files or a backend API.
pub trait RecordSource: Send + Sync {
    fn fetch(&self) -> impl std::future::Future<Output = Result<Vec<Record>>> + Send;
}

pub trait SessionProvider: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Result<Session>;
}

pub trait ReportSettings: Send + Sync {
    fn query(&self) -> Query;
    fn export_columns(&self) -> Vec<ExportColumn>;
    fn output_path(&self) -> &str;
    fn export_filename(&self) -> &str;
    fn summary_field(&self) -> Option<&str>;
    fn summary_chart(&self) -> ChartKind;
    fn bundle(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<ReportResult>;
    async fn load(&self, result: ReportResult) -> Result<String>;
}
