use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a report pipeline through extract, transform and load.
pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Returns the path the report was written to.
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting report run");
        self.monitor.log_stats("start");

        tracing::info!("Fetching records...");
        let records = self.pipeline.extract().await?;
        tracing::info!("Fetched {} records", records.len());
        self.monitor.log_stats("extract");

        tracing::info!("Applying query...");
        let result = self.pipeline.transform(records).await?;
        tracing::info!(
            "{} records matched, page {}/{} holds {}",
            result.matched_records.len(),
            result.page.number(),
            result.page.total_pages.max(1),
            result.page.items.len()
        );
        self.monitor.log_stats("transform");

        tracing::info!("Writing report...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Report saved to: {}", output_path);
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
