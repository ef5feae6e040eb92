use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },

    #[error("Cannot enumerate input directory {path}: {source}")]
    InputDirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process contract file {path}: {message}")]
    FileProcessingError { path: PathBuf, message: String },

    #[error("Output sink '{stream}' failed: {message}")]
    SinkError { stream: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// 錯誤分類，用於日誌與退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 程序退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::InputDirectoryError { .. } => ErrorCategory::Input,
            EtlError::FileProcessingError { .. } | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
            EtlError::CsvError(_)
            | EtlError::ZipError(_)
            | EtlError::SerializationError(_)
            | EtlError::SinkError { .. } => ErrorCategory::Output,
            EtlError::IoError(_) | EtlError::TaskError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一檔案失敗不會中止批次
            EtlError::FileProcessingError { .. } => ErrorSeverity::Low,
            EtlError::SerializationError(_) | EtlError::ZipError(_) => ErrorSeverity::Medium,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InputDirectoryError { .. }
            | EtlError::CsvError(_)
            | EtlError::SinkError { .. }
            | EtlError::ProcessingError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::TaskError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::InputDirectoryError { path, .. } => {
                format!("Input directory {} could not be read", path.display())
            }
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            EtlError::MissingConfigError { field } => {
                format!("Configuration value '{}' is required", field)
            }
            EtlError::ConfigValidationError { field, message } => {
                format!("Configuration '{}' could not be loaded: {}", field, message)
            }
            EtlError::SinkError { stream, .. } => {
                format!("Writing the {} output failed", stream)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the configuration file and command-line flags",
            ErrorCategory::Input => "Make sure the input root exists and is readable",
            ErrorCategory::Processing => "Inspect the contract file named in the log; the rest of the batch is unaffected",
            ErrorCategory::Output => "Check free disk space and write permissions on the output directory",
            ErrorCategory::System => "Retry the run; if it keeps failing, check system resources",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_failure_is_recoverable() {
        let err = EtlError::FileProcessingError {
            path: PathBuf::from("DEST_A/ID_B2B_1#X_2_3"),
            message: "truncated".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Processing);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.severity().exit_code(), 0);
    }

    #[test]
    fn test_input_directory_error_is_high_severity() {
        let err = EtlError::InputDirectoryError {
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.severity().exit_code(), 1);
        assert!(err.user_friendly_message().contains("/missing"));
    }
}
