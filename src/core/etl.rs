use crate::core::Pipeline;
use crate::domain::model::RunSummary;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("🚀 Starting contract ETL run");

        // Discover
        let files = self.pipeline.discover().await?;
        tracing::info!("📂 Discovered {} contract files", files.len());
        self.monitor.log_stats("Discovery");

        // Process
        let result = self.pipeline.process(files).await?;
        self.monitor.log_stats("Processing");

        // Finalize
        let summary = self.pipeline.finalize(result).await?;
        log_summary(&summary);
        self.monitor.log_final_stats();

        Ok(summary)
    }
}

pub fn log_summary(summary: &RunSummary) {
    tracing::info!(
        "📋 Files: {} total, {} processed, {} failed, {} skipped ({} oversize, {} without hotel id)",
        summary.total_files,
        summary.processed,
        summary.failed,
        summary.skipped(),
        summary.skipped_oversize,
        summary.skipped_no_hotel_id
    );
    tracing::info!(
        "📋 Rows: {} inventory -> {}, {} rates -> {}",
        summary.inventory_rows,
        summary.inventory_path.display(),
        summary.rate_rows,
        summary.rates_path.display()
    );
    if let Some(bundle) = &summary.bundle_path {
        tracing::info!("📦 Bundle: {}", bundle.display());
    }
    tracing::info!("⏱️ Elapsed: {} ms", summary.elapsed_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ContractFile, HotelId};
    use crate::domain::ports::ProcessResult;
    use crate::utils::error::EtlError;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockPipeline {
        fail_discovery: bool,
        phases: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Pipeline for MockPipeline {
        async fn discover(&self) -> Result<Vec<ContractFile>> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            if self.fail_discovery {
                return Err(EtlError::InputDirectoryError {
                    path: PathBuf::from("/nowhere"),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(vec![ContractFile {
                path: PathBuf::from("DEST/ID_B2B_1#X_9_1"),
                filename: "ID_B2B_1#X_9_1".to_string(),
                hotel_id: Some(HotelId(9)),
            }])
        }

        async fn process(&self, files: Vec<ContractFile>) -> Result<ProcessResult> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            Ok(ProcessResult {
                started_at: Utc::now(),
                total_files: files.len(),
                processed: files.len(),
                failed: 0,
                skipped_oversize: 0,
                skipped_no_hotel_id: 0,
                inventory_rows: 3,
                rate_rows: 4,
            })
        }

        async fn finalize(&self, result: ProcessResult) -> Result<RunSummary> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            Ok(RunSummary {
                started_at: result.started_at,
                total_files: result.total_files,
                processed: result.processed,
                failed: result.failed,
                skipped_oversize: result.skipped_oversize,
                skipped_no_hotel_id: result.skipped_no_hotel_id,
                inventory_rows: result.inventory_rows,
                rate_rows: result.rate_rows,
                elapsed_ms: 0,
                inventory_path: PathBuf::from("hotel_inventory.csv"),
                rates_path: PathBuf::from("hotel_rates.csv"),
                bundle_path: None,
            })
        }
    }

    #[tokio::test]
    async fn test_engine_runs_all_phases() {
        let engine = EtlEngine::new(MockPipeline::default());
        let summary = tokio_test::assert_ok!(engine.run().await);

        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.inventory_rows, 3);
        assert_eq!(summary.rate_rows, 4);
        assert_eq!(engine.pipeline().phases.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_engine_stops_on_fatal_discovery_error() {
        let engine = EtlEngine::new(MockPipeline {
            fail_discovery: true,
            ..Default::default()
        });

        let result = engine.run().await;
        assert!(matches!(result, Err(EtlError::InputDirectoryError { .. })));
        assert_eq!(engine.pipeline().phases.load(Ordering::SeqCst), 1);
    }
}
