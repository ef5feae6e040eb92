//! 合約檔批次處理
//!
//! 每個通過准入的檔案在有上限的 worker pool 中逐行經過 splitter 與解碼器。
//! 解碼後的批次經由有界通道送往各輸出串流唯一的 blocking writer，
//! 不會把整個檔案或整體結果留在記憶體中。

use crate::core::bundle::bundle_outputs;
use crate::core::decoder::DecoderRegistry;
use crate::core::discovery::discover_contract_files;
use crate::core::run_context::RunContext;
use crate::core::sink::{drain_into_sink, CsvSink, SinkOptions};
use crate::core::splitter::SectionSplitter;
use crate::domain::model::{
    ContractFile, FileOutcome, HotelId, InventoryRecord, RateRecord, RecordBatch, RunSummary,
    TableRow,
};
use crate::domain::ports::{ConfigProvider, Pipeline, ProcessResult};
use crate::utils::error::{EtlError, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{self, JoinError, JoinSet};

pub const SUMMARY_FILE: &str = "run_summary.json";

/// 檔案准入判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted { hotel_id: HotelId, size: u64 },
    Oversize { size: u64 },
    NoHotelId,
    Unreadable { reason: String },
}

/// 先檢查檔案大小，再檢查是否有飯店識別碼
pub async fn admit(file: &ContractFile, max_file_size: u64) -> Admission {
    let size = match tokio::fs::metadata(&file.path).await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            return Admission::Unreadable {
                reason: e.to_string(),
            }
        }
    };

    if size > max_file_size {
        return Admission::Oversize { size };
    }

    match file.hotel_id {
        Some(hotel_id) => Admission::Accepted { hotel_id, size },
        None => Admission::NoHotelId,
    }
}

/// 兩個輸出佇列的送出端
#[derive(Clone)]
pub struct SinkSenders {
    inventory: mpsc::Sender<Vec<InventoryRecord>>,
    rates: mpsc::Sender<Vec<RateRecord>>,
}

impl SinkSenders {
    pub fn new(
        inventory: mpsc::Sender<Vec<InventoryRecord>>,
        rates: mpsc::Sender<Vec<RateRecord>>,
    ) -> Self {
        Self { inventory, rates }
    }

    async fn dispatch(&self, batch: RecordBatch) -> Result<(usize, usize)> {
        let counts = (batch.inventory.len(), batch.rates.len());

        if !batch.inventory.is_empty() {
            send_batch(&self.inventory, batch.inventory).await?;
        }
        if !batch.rates.is_empty() {
            send_batch(&self.rates, batch.rates).await?;
        }

        Ok(counts)
    }
}

async fn send_batch<R: TableRow>(sender: &mpsc::Sender<Vec<R>>, rows: Vec<R>) -> Result<()> {
    sender.send(rows).await.map_err(|_| EtlError::SinkError {
        stream: R::TABLE.to_string(),
        message: "writer stopped accepting rows".to_string(),
    })
}

/// 逐行讀取單一合約，每關閉一個區段就解碼並送出
///
/// 非 UTF-8 位元組以替代字元處理，不使整個檔案失敗。
pub async fn stream_contract<R>(
    mut reader: R,
    hotel_id: HotelId,
    registry: &DecoderRegistry,
    senders: &SinkSenders,
) -> Result<(usize, usize)>
where
    R: AsyncBufRead + Unpin,
{
    let mut splitter = SectionSplitter::new();
    let mut buf = Vec::new();
    let (mut inventory_rows, mut rate_rows) = (0, 0);

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        if let Some(section) = splitter.push_line(&line) {
            tracing::trace!("Flushing {{{}}} with {} lines", section.tag, section.lines.len());
            let (inventory, rates) = senders
                .dispatch(registry.decode_section(hotel_id, &section))
                .await?;
            inventory_rows += inventory;
            rate_rows += rates;
        }
    }

    if let Some(section) = splitter.finish() {
        let (inventory, rates) = senders
            .dispatch(registry.decode_section(hotel_id, &section))
            .await?;
        inventory_rows += inventory;
        rate_rows += rates;
    }

    Ok((inventory_rows, rate_rows))
}

struct ContractWorker {
    registry: DecoderRegistry,
    max_file_size: u64,
}

impl ContractWorker {
    /// 單檔錯誤在此攔截，只回報為 `Failed`
    async fn run(&self, file: &ContractFile, senders: &SinkSenders) -> FileOutcome {
        let hotel_id = match admit(file, self.max_file_size).await {
            Admission::Accepted { hotel_id, .. } => hotel_id,
            Admission::Oversize { size } => {
                tracing::debug!(
                    "Skipping {} ({} bytes exceeds {} byte limit)",
                    file.filename,
                    size,
                    self.max_file_size
                );
                return FileOutcome::SkippedOversize { size };
            }
            Admission::NoHotelId => {
                tracing::debug!("Skipping {} (no hotel id in filename)", file.filename);
                return FileOutcome::SkippedNoHotelId;
            }
            Admission::Unreadable { reason } => {
                self.report_failure(file, reason);
                return FileOutcome::Failed;
            }
        };

        let result = match tokio::fs::File::open(&file.path).await {
            Ok(handle) => {
                stream_contract(BufReader::new(handle), hotel_id, &self.registry, senders).await
            }
            Err(e) => Err(e.into()),
        };

        match result {
            Ok((inventory_rows, rate_rows)) => {
                tracing::debug!(
                    "Processed {} (hotel {}): {} inventory rows, {} rate rows",
                    file.filename,
                    hotel_id,
                    inventory_rows,
                    rate_rows
                );
                FileOutcome::Processed {
                    inventory_rows,
                    rate_rows,
                }
            }
            Err(e) => {
                self.report_failure(file, e.to_string());
                FileOutcome::Failed
            }
        }
    }

    fn report_failure(&self, file: &ContractFile, message: String) {
        let error = EtlError::FileProcessingError {
            path: file.path.clone(),
            message,
        };
        tracing::warn!("⚠️ {}", error);
    }
}

/// 合約批次處理器：discover → process → finalize
pub struct BatchOrchestrator<C: ConfigProvider> {
    config: C,
    registry: DecoderRegistry,
}

impl<C: ConfigProvider> BatchOrchestrator<C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            registry: DecoderRegistry::default(),
        }
    }

    pub fn inventory_path(&self) -> PathBuf {
        Path::new(self.config.output_dir()).join(self.config.inventory_file())
    }

    pub fn rates_path(&self) -> PathBuf {
        Path::new(self.config.output_dir()).join(self.config.rates_file())
    }

    fn sink_options(&self) -> SinkOptions {
        SinkOptions {
            delimiter: self.config.delimiter(),
            include_header: self.config.include_header(),
        }
    }

    /// 只做准入判定，不開啟輸出（dry run 用）
    pub async fn plan(&self, files: &[ContractFile]) -> Vec<Admission> {
        let mut admissions = Vec::with_capacity(files.len());
        for file in files {
            admissions.push(admit(file, self.config.max_file_size()).await);
        }
        admissions
    }

    async fn run_workers(
        &self,
        files: Vec<ContractFile>,
        senders: SinkSenders,
        ctx: Arc<RunContext>,
    ) -> Result<()> {
        let worker = Arc::new(ContractWorker {
            registry: self.registry.clone(),
            max_file_size: self.config.max_file_size(),
        });
        let semaphore = Arc::new(Semaphore::new(self.config.workers().max(1)));
        let mut tasks = JoinSet::new();

        for file in files {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| EtlError::ProcessingError {
                    message: format!("Worker pool closed: {}", e),
                })?;

            let worker = worker.clone();
            let senders = senders.clone();
            let task_ctx = ctx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = worker.run(&file, &senders).await;
                task_ctx.record(&outcome);
            });

            while let Some(joined) = tasks.try_join_next() {
                reap_worker(joined, &ctx);
            }
        }

        // writer 在所有 sender 釋放後結束
        drop(senders);

        while let Some(joined) = tasks.join_next().await {
            reap_worker(joined, &ctx);
        }

        Ok(())
    }
}

fn reap_worker(joined: std::result::Result<(), JoinError>, ctx: &RunContext) {
    if let Err(e) = joined {
        tracing::warn!("⚠️ Worker task aborted: {}", e);
        ctx.record(&FileOutcome::Failed);
    }
}

#[async_trait::async_trait]
impl<C: ConfigProvider> Pipeline for BatchOrchestrator<C> {
    async fn discover(&self) -> Result<Vec<ContractFile>> {
        let root = Path::new(self.config.input_root());
        tracing::info!("🔍 Discovering contract files under {}", root.display());

        discover_contract_files(
            root,
            self.config.destination_prefix(),
            self.config.contract_prefix(),
        )
        .await
    }

    async fn process(&self, files: Vec<ContractFile>) -> Result<ProcessResult> {
        let ctx = Arc::new(RunContext::new(files.len(), self.config.progress_interval()));

        let options = self.sink_options();
        let inventory_sink = CsvSink::<InventoryRecord>::open(self.inventory_path(), options)?;
        let rates_sink = CsvSink::<RateRecord>::open(self.rates_path(), options)?;

        let capacity = self.config.channel_capacity().max(1);
        let (inventory_tx, inventory_rx) = mpsc::channel(capacity);
        let (rates_tx, rates_rx) = mpsc::channel(capacity);

        let inventory_writer =
            task::spawn_blocking(move || drain_into_sink(inventory_sink, inventory_rx));
        let rates_writer = task::spawn_blocking(move || drain_into_sink(rates_sink, rates_rx));

        tracing::info!(
            "⚙️ Processing {} files with {} workers",
            files.len(),
            self.config.workers().max(1)
        );
        self.run_workers(files, SinkSenders::new(inventory_tx, rates_tx), ctx.clone())
            .await?;

        let inventory_rows = inventory_writer.await??;
        let rate_rows = rates_writer.await??;
        let counts = ctx.counts();
        if counts.accounted() != counts.total_files {
            tracing::warn!(
                "⚠️ {} of {} files have no recorded outcome",
                counts.total_files.saturating_sub(counts.accounted()),
                counts.total_files
            );
        }

        Ok(ProcessResult {
            started_at: ctx.started_at(),
            total_files: counts.total_files,
            processed: counts.processed,
            failed: counts.failed,
            skipped_oversize: counts.skipped_oversize,
            skipped_no_hotel_id: counts.skipped_no_hotel_id,
            inventory_rows,
            rate_rows,
        })
    }

    async fn finalize(&self, result: ProcessResult) -> Result<RunSummary> {
        let inventory_path = self.inventory_path();
        let rates_path = self.rates_path();

        let bundle_path = match self.config.bundle_file() {
            Some(name) => {
                let destination = Path::new(self.config.output_dir()).join(name);
                let sources = vec![inventory_path.clone(), rates_path.clone()];
                Some(task::spawn_blocking(move || bundle_outputs(&sources, &destination)).await??)
            }
            None => None,
        };

        let elapsed_ms = (Utc::now() - result.started_at).num_milliseconds().max(0) as u64;
        let summary = RunSummary {
            started_at: result.started_at,
            total_files: result.total_files,
            processed: result.processed,
            failed: result.failed,
            skipped_oversize: result.skipped_oversize,
            skipped_no_hotel_id: result.skipped_no_hotel_id,
            inventory_rows: result.inventory_rows,
            rate_rows: result.rate_rows,
            elapsed_ms,
            inventory_path,
            rates_path,
            bundle_path,
        };

        if self.config.write_summary() {
            let path = Path::new(self.config.output_dir()).join(SUMMARY_FILE);
            let json = serde_json::to_vec_pretty(&summary)?;
            tokio::fs::write(&path, json).await?;
            tracing::debug!("Run summary written to {}", path.display());
        }

        Ok(summary)
    }
}
