pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_file_name, validate_path, validate_positive_number};
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_delimiter, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_INPUT_ROOT: &str = "./contracts";
pub const DEFAULT_CONTRACT_PREFIX: &str = "ID_B2B_";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_OUTPUT_DIR: &str = "./output";
pub const DEFAULT_INVENTORY_FILE: &str = "hotel_inventory.csv";
pub const DEFAULT_RATES_FILE: &str = "hotel_rates.csv";
pub const DEFAULT_BUNDLE_FILE: &str = "contract_output.zip";
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "contract-etl")]
#[command(about = "Convert hotel contract files into inventory and rate CSV streams")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_INPUT_ROOT)]
    pub input_dir: String,

    #[arg(long, default_value = "", help = "Required prefix of destination directory names")]
    pub destination_prefix: String,

    #[arg(long, default_value = DEFAULT_CONTRACT_PREFIX)]
    pub contract_prefix: String,

    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE, help = "Skip files larger than this many bytes")]
    pub max_file_size: u64,

    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: String,

    #[arg(long, default_value = DEFAULT_INVENTORY_FILE)]
    pub inventory_file: String,

    #[arg(long, default_value = DEFAULT_RATES_FILE)]
    pub rates_file: String,

    #[arg(long, default_value = ",")]
    pub delimiter: String,

    #[arg(long, help = "Do not write the column-name row")]
    pub no_header: bool,

    #[arg(long, help = "Bundle both output streams into a ZIP archive")]
    pub bundle: Option<String>,

    #[arg(long, help = "Do not write run_summary.json")]
    pub no_summary: bool,

    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: usize,

    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_root(&self) -> &str {
        &self.input_dir
    }

    fn destination_prefix(&self) -> &str {
        &self.destination_prefix
    }

    fn contract_prefix(&self) -> &str {
        &self.contract_prefix
    }

    fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn inventory_file(&self) -> &str {
        &self.inventory_file
    }

    fn rates_file(&self) -> &str {
        &self.rates_file
    }

    fn delimiter(&self) -> u8 {
        // 驗證後必為單一位元組
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    fn include_header(&self) -> bool {
        !self.no_header
    }

    fn bundle_file(&self) -> Option<&str> {
        self.bundle.as_deref()
    }

    fn write_summary(&self) -> bool {
        !self.no_summary
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn progress_interval(&self) -> usize {
        self.progress_interval
    }

    fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)?;
        validate_delimiter("delimiter", &self.delimiter)?;
        if let Some(bundle) = &self.bundle {
            validate_file_name("bundle", bundle)?;
        }
        Ok(())
    }
}

/// 兩種設定來源共用的檢查
pub fn validate_provider<C: ConfigProvider>(config: &C) -> Result<()> {
    validate_path("input.root_dir", config.input_root())?;
    validate_path("output.dir", config.output_dir())?;
    validate_file_name("output.inventory_file", config.inventory_file())?;
    validate_file_name("output.rates_file", config.rates_file())?;
    if config.inventory_file() == config.rates_file() {
        return Err(EtlError::InvalidConfigValueError {
            field: "output.rates_file".to_string(),
            value: config.rates_file().to_string(),
            reason: "Inventory and rate streams must use different files".to_string(),
        });
    }

    validate_positive_number("input.max_file_size_bytes", config.max_file_size(), 1)?;
    validate_positive_number("processing.workers", config.workers() as u64, 1)?;
    validate_positive_number(
        "processing.progress_interval",
        config.progress_interval() as u64,
        1,
    )?;
    validate_positive_number(
        "processing.channel_capacity",
        config.channel_capacity() as u64,
        1,
    )?;

    Ok(())
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::parse_from(["contract-etl"]);

        assert_eq!(config.input_root(), DEFAULT_INPUT_ROOT);
        assert_eq!(config.contract_prefix(), "ID_B2B_");
        assert_eq!(config.destination_prefix(), "");
        assert_eq!(config.max_file_size(), 52_428_800);
        assert_eq!(config.delimiter(), b',');
        assert!(config.include_header());
        assert!(config.write_summary());
        assert_eq!(config.bundle_file(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides() {
        let config = CliConfig::parse_from([
            "contract-etl",
            "--input-dir",
            "/data/contracts",
            "--max-file-size",
            "1024",
            "--workers",
            "1",
            "--delimiter",
            "\t",
            "--no-header",
            "--bundle",
            "out.zip",
        ]);

        assert_eq!(config.input_root(), "/data/contracts");
        assert_eq!(config.max_file_size(), 1024);
        assert_eq!(config.workers(), 1);
        assert_eq!(config.delimiter(), b'\t');
        assert!(!config.include_header());
        assert_eq!(config.bundle_file(), Some("out.zip"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_validation_rejects_bad_values() {
        let zero_workers = CliConfig::parse_from(["contract-etl", "--workers", "0"]);
        assert!(zero_workers.validate().is_err());

        let same_files = CliConfig::parse_from([
            "contract-etl",
            "--inventory-file",
            "rows.csv",
            "--rates-file",
            "rows.csv",
        ]);
        assert!(same_files.validate().is_err());

        let bad_delimiter = CliConfig::parse_from(["contract-etl", "--delimiter", "ab"]);
        assert!(bad_delimiter.validate().is_err());
    }
}
