use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// 物業（飯店）識別碼，由合約檔名推導
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HotelId(pub u64);

impl fmt::Display for HotelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 目錄掃描時發現的合約檔
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFile {
    pub path: PathBuf,
    pub filename: String,
    pub hotel_id: Option<HotelId>,
}

/// 區段標籤；未知標籤保留原文但不解碼
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionTag {
    Inventory,
    Rates,
    Other(String),
}

impl SectionTag {
    pub fn from_code(code: &str) -> Self {
        match code {
            "SIIN" => SectionTag::Inventory,
            "SIAP" => SectionTag::Rates,
            other => SectionTag::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            SectionTag::Inventory => "SIIN",
            SectionTag::Rates => "SIAP",
            SectionTag::Other(code) => code,
        }
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 一個已關閉區段的內容（已 trim 的非空白行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBody {
    pub tag: SectionTag,
    pub lines: Vec<String>,
}

/// 輸出資料表的固定欄位順序
pub trait TableRow: Serialize + Send + 'static {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRecord {
    pub hotel_id: HotelId,
    pub room_code: String,
    pub board_code: String,
    pub date_from: String,
    pub date_to: String,
    pub availability_data: String,
}

impl TableRow for InventoryRecord {
    const TABLE: &'static str = "hotel_inventory";
    const COLUMNS: &'static [&'static str] = &[
        "hotel_id",
        "room_code",
        "board_code",
        "date_from",
        "date_to",
        "availability_data",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRecord {
    pub hotel_id: HotelId,
    pub room_code: String,
    pub board_code: String,
    pub date_from: String,
    pub date_to: String,
    pub rate_type: String,
    // 此階段不計算 base_price / tax_amount，固定為 0
    pub base_price: f64,
    pub tax_amount: f64,
    pub adults: i32,
    pub board_type: String,
    pub price: f64,
}

impl TableRow for RateRecord {
    const TABLE: &'static str = "hotel_rates";
    const COLUMNS: &'static [&'static str] = &[
        "hotel_id",
        "room_code",
        "board_code",
        "date_from",
        "date_to",
        "rate_type",
        "base_price",
        "tax_amount",
        "adults",
        "board_type",
        "price",
    ];
}

/// 價格清單中的一組 `(a,b,c)`；只有 `price` 會往下游傳遞
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTuple<'a> {
    pub first: &'a str,
    pub second: &'a str,
    pub price: Option<f64>,
}

/// 單一區段解碼後的紀錄批次
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordBatch {
    pub inventory: Vec<InventoryRecord>,
    pub rates: Vec<RateRecord>,
}

impl RecordBatch {
    pub fn is_empty(&self) -> bool {
        self.inventory.is_empty() && self.rates.is_empty()
    }
}

/// 單檔處理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Processed {
        inventory_rows: usize,
        rate_rows: usize,
    },
    SkippedOversize {
        size: u64,
    },
    SkippedNoHotelId,
    Failed,
}

/// 整批執行摘要，同時寫成 run_summary.json
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub total_files: usize,
    pub processed: usize,
    pub failed: usize,
    pub skipped_oversize: usize,
    pub skipped_no_hotel_id: usize,
    pub inventory_rows: u64,
    pub rate_rows: u64,
    pub elapsed_ms: u64,
    pub inventory_path: PathBuf,
    pub rates_path: PathBuf,
    pub bundle_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_oversize + self.skipped_no_hotel_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_tag_codes() {
        assert_eq!(SectionTag::from_code("SIIN"), SectionTag::Inventory);
        assert_eq!(SectionTag::from_code("SIAP"), SectionTag::Rates);
        assert_eq!(
            SectionTag::from_code("CNHA"),
            SectionTag::Other("CNHA".to_string())
        );
        assert_eq!(SectionTag::Other("CNHA".to_string()).code(), "CNHA");
    }

    #[test]
    fn test_column_counts_match_structs() {
        assert_eq!(InventoryRecord::COLUMNS.len(), 6);
        assert_eq!(RateRecord::COLUMNS.len(), 11);
    }
}
