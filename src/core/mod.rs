pub mod bundle;
pub mod decoder;
pub mod discovery;
pub mod etl;
pub mod hotel_id;
pub mod orchestrator;
pub mod run_context;
pub mod sink;
pub mod splitter;

pub use crate::domain::model::{ContractFile, RunSummary};
pub use crate::domain::ports::{ConfigProvider, Pipeline, ProcessResult, SectionDecoder};
pub use crate::utils::error::Result;
