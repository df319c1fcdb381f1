pub mod chart;
pub mod engine;
pub mod export;
pub mod extraction;
pub mod geo;
pub mod query;
pub mod session;

pub use crate::domain::model::{ChartDatum, Page, Record, ReportResult};
pub use crate::domain::ports::{Pipeline, RecordSource, ReportSettings, SessionProvider, Storage};
pub use crate::utils::error::Result;
