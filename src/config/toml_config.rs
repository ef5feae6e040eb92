use crate::config::{
    validate_provider, DEFAULT_BUNDLE_FILE, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CONTRACT_PREFIX,
    DEFAULT_INPUT_ROOT, DEFAULT_INVENTORY_FILE, DEFAULT_MAX_FILE_SIZE, DEFAULT_OUTPUT_DIR,
    DEFAULT_PROGRESS_INTERVAL, DEFAULT_RATES_FILE, DEFAULT_WORKERS,
};
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_delimiter, validate_file_name, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub root_dir: String,
    pub destination_prefix: String,
    pub contract_prefix: String,
    pub max_file_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub inventory_file: String,
    pub rates_file: String,
    pub delimiter: String,
    pub include_header: bool,
    pub write_summary: bool,
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub workers: usize,
    pub progress_interval: usize,
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            root_dir: DEFAULT_INPUT_ROOT.to_string(),
            destination_prefix: String::new(),
            contract_prefix: DEFAULT_CONTRACT_PREFIX.to_string(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_OUTPUT_DIR.to_string(),
            inventory_file: DEFAULT_INVENTORY_FILE.to_string(),
            rates_file: DEFAULT_RATES_FILE.to_string(),
            delimiter: ",".to_string(),
            include_header: true,
            write_summary: true,
            compression: CompressionConfig::default(),
        }
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filename: DEFAULT_BUNDLE_FILE.to_string(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CONTRACTS_ROOT})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_provider(self)?;
        validate_delimiter("output.delimiter", &self.output.delimiter)?;
        if self.output.compression.enabled {
            validate_file_name("output.compression.filename", &self.output.compression.filename)?;
        }
        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl ConfigProvider for TomlConfig {
    fn input_root(&self) -> &str {
        &self.input.root_dir
    }

    fn destination_prefix(&self) -> &str {
        &self.input.destination_prefix
    }

    fn contract_prefix(&self) -> &str {
        &self.input.contract_prefix
    }

    fn max_file_size(&self) -> u64 {
        self.input.max_file_size_bytes
    }

    fn output_dir(&self) -> &str {
        &self.output.dir
    }

    fn inventory_file(&self) -> &str {
        &self.output.inventory_file
    }

    fn rates_file(&self) -> &str {
        &self.output.rates_file
    }

    fn delimiter(&self) -> u8 {
        self.output.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    fn include_header(&self) -> bool {
        self.output.include_header
    }

    fn bundle_file(&self) -> Option<&str> {
        self.output
            .compression
            .enabled
            .then_some(self.output.compression.filename.as_str())
    }

    fn write_summary(&self) -> bool {
        self.output.write_summary
    }

    fn workers(&self) -> usize {
        self.processing.workers
    }

    fn progress_interval(&self) -> usize {
        self.processing.progress_interval
    }

    fn channel_capacity(&self) -> usize {
        self.processing.channel_capacity
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[input]
root_dir = "/data/contracts"
destination_prefix = "DEST_"
contract_prefix = "ID_B2B_"
max_file_size_bytes = 1048576

[output]
dir = "/data/out"
delimiter = "\t"
include_header = false

[output.compression]
enabled = true
filename = "bundle.zip"

[processing]
workers = 8
progress_interval = 10

[monitoring]
enabled = true
log_level = "debug"
json_logs = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.input_root(), "/data/contracts");
        assert_eq!(config.destination_prefix(), "DEST_");
        assert_eq!(config.max_file_size(), 1_048_576);
        assert_eq!(config.delimiter(), b'\t');
        assert!(!config.include_header());
        assert_eq!(config.bundle_file(), Some("bundle.zip"));
        assert_eq!(config.workers(), 8);
        assert_eq!(config.progress_interval(), 10);
        assert_eq!(config.channel_capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.inventory_file(), "hotel_inventory.csv");
        assert!(config.monitoring_enabled());
        assert_eq!(config.monitoring.log_level.as_deref(), Some("debug"));
        assert!(config.monitoring.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.input_root(), DEFAULT_INPUT_ROOT);
        assert_eq!(config.max_file_size(), 50 * 1024 * 1024);
        assert_eq!(config.bundle_file(), None);
        assert!(config.write_summary());
        assert!(!config.monitoring_enabled());
        assert!(config.monitoring.log_level.is_none());
        assert!(!config.monitoring.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CONTRACT_ETL_TEST_ROOT", "/mnt/feed");

        let toml_content = r#"
[input]
root_dir = "${CONTRACT_ETL_TEST_ROOT}"

[output]
dir = "${CONTRACT_ETL_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input.root_dir, "/mnt/feed");
        assert_eq!(config.output.dir, "${CONTRACT_ETL_UNSET_VARIABLE}");

        std::env::remove_var("CONTRACT_ETL_TEST_ROOT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[processing]
workers = 0
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = r#"
[output]
delimiter = "||"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[input\nroot_dir = 1");
        assert!(matches!(
            result,
            Err(EtlError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[input]
root_dir = "./from-file"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_root(), "./from-file");
    }
}
