pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use core::{etl::EtlEngine, orchestrator::BatchOrchestrator};
pub use domain::model::{InventoryRecord, RateRecord, RunSummary};
pub use utils::error::{EtlError, Result};
