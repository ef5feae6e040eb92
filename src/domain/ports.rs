use crate::domain::model::{ContractFile, HotelId, RecordBatch, RunSummary, SectionTag};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub trait ConfigProvider: Send + Sync {
    fn input_root(&self) -> &str;
    fn destination_prefix(&self) -> &str;
    fn contract_prefix(&self) -> &str;
    fn max_file_size(&self) -> u64;

    fn output_dir(&self) -> &str;
    fn inventory_file(&self) -> &str;
    fn rates_file(&self) -> &str;
    fn delimiter(&self) -> u8;
    fn include_header(&self) -> bool;
    /// ZIP 打包檔名；`None` 表示不打包
    fn bundle_file(&self) -> Option<&str>;
    fn write_summary(&self) -> bool;

    fn workers(&self) -> usize;
    fn progress_interval(&self) -> usize;
    fn channel_capacity(&self) -> usize;
}

/// 一種區段標籤對應一個解碼策略
pub trait SectionDecoder: Send + Sync {
    fn tag(&self) -> SectionTag;

    /// 解碼一行區段內容；格式不符的行直接略過，不視為錯誤
    fn decode_line(&self, hotel_id: HotelId, line: &str, out: &mut RecordBatch);
}

/// 單一輸出串流；由唯一的 writer 持有
pub trait RecordSink<R>: Send {
    fn write(&mut self, record: &R) -> Result<()>;
    /// flush 並釋放目的地，回傳總列數
    fn close(&mut self) -> Result<u64>;
}

/// `process` 階段交給 `finalize` 的中繼結果
#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub started_at: DateTime<Utc>,
    pub total_files: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped_oversize: usize,
    pub skipped_no_hotel_id: usize,
    pub inventory_rows: u64,
    pub rate_rows: u64,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn discover(&self) -> Result<Vec<ContractFile>>;
    async fn process(&self, files: Vec<ContractFile>) -> Result<ProcessResult>;
    async fn finalize(&self, result: ProcessResult) -> Result<RunSummary>;
}
