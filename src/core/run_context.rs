use crate::domain::model::FileOutcome;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// 整批執行的共享計數器；worker 之間以 `Arc` 共用
#[derive(Debug)]
pub struct RunContext {
    started_at: DateTime<Utc>,
    start: Instant,
    total_files: usize,
    progress_interval: usize,
    processed: AtomicUsize,
    failed: AtomicUsize,
    skipped_oversize: AtomicUsize,
    skipped_no_hotel_id: AtomicUsize,
    finished: AtomicUsize,
}

/// 某一時間點的計數快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCounts {
    pub total_files: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped_oversize: usize,
    pub skipped_no_hotel_id: usize,
}

impl RunContext {
    pub fn new(total_files: usize, progress_interval: usize) -> Self {
        Self {
            started_at: Utc::now(),
            start: Instant::now(),
            total_files,
            progress_interval: progress_interval.max(1),
            processed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped_oversize: AtomicUsize::new(0),
            skipped_no_hotel_id: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// 記錄單檔結果，每 `progress_interval` 個檔案輸出一次進度
    pub fn record(&self, outcome: &FileOutcome) {
        let counter = match outcome {
            FileOutcome::Processed { .. } => &self.processed,
            FileOutcome::Failed => &self.failed,
            FileOutcome::SkippedOversize { .. } => &self.skipped_oversize,
            FileOutcome::SkippedNoHotelId => &self.skipped_no_hotel_id,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let finished = self.finished.fetch_add(1, Ordering::AcqRel) + 1;
        if finished % self.progress_interval == 0 || finished == self.total_files {
            self.log_progress(finished);
        }
    }

    fn log_progress(&self, finished: usize) {
        let percent = if self.total_files > 0 {
            finished as f64 / self.total_files as f64 * 100.0
        } else {
            100.0
        };
        tracing::info!(
            "📈 Progress: {}/{} files ({:.1}%), failed: {}, elapsed: {:.1?}",
            finished,
            self.total_files,
            percent,
            self.failed.load(Ordering::Relaxed),
            self.elapsed()
        );
    }

    pub fn counts(&self) -> RunCounts {
        RunCounts {
            total_files: self.total_files,
            processed: self.processed.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            skipped_oversize: self.skipped_oversize.load(Ordering::Acquire),
            skipped_no_hotel_id: self.skipped_no_hotel_id.load(Ordering::Acquire),
        }
    }
}

impl RunCounts {
    pub fn accounted(&self) -> usize {
        self.processed + self.failed + self.skipped_oversize + self.skipped_no_hotel_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_outcomes_are_counted_by_kind() {
        let ctx = RunContext::new(5, 2);
        ctx.record(&FileOutcome::Processed {
            inventory_rows: 3,
            rate_rows: 1,
        });
        ctx.record(&FileOutcome::Failed);
        ctx.record(&FileOutcome::SkippedOversize { size: 1024 });
        ctx.record(&FileOutcome::SkippedNoHotelId);
        ctx.record(&FileOutcome::Processed {
            inventory_rows: 0,
            rate_rows: 0,
        });

        let counts = ctx.counts();
        assert_eq!(counts.processed, 2);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.skipped_oversize, 1);
        assert_eq!(counts.skipped_no_hotel_id, 1);
        assert_eq!(counts.accounted(), counts.total_files);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let ctx = RunContext::new(1, 0);
        ctx.record(&FileOutcome::Failed);
        assert_eq!(ctx.counts().failed, 1);
    }

    #[tokio::test]
    async fn test_concurrent_recording() {
        let ctx = Arc::new(RunContext::new(400, 50));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    ctx.record(&FileOutcome::SkippedNoHotelId);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(ctx.counts().skipped_no_hotel_id, 400);
    }
}
