pub mod config;
pub mod data_assistant;
pub mod dataset;
pub mod db;
pub mod error;
pub mod execution;
pub mod interpreter;
pub mod llm;
pub mod observability;
pub mod sql_engine;
pub mod sql_synthesizer;

pub use config::AppConfig;
pub use data_assistant::{AnalysisResponse, AnsweredBy, DataAssistant};
pub use dataset::Dataset;
pub use error::{AnalystError, Result};
pub use execution::QueryResult;
pub use llm::ProviderRegistry;
