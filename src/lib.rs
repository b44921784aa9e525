pub mod benchmark;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod confirm;
pub mod logging;
pub mod metrics;
pub mod report;

pub use benchmark::{BenchmarkRunner, EvaluationResult, Measurement, RunOutcome, Throughput};
pub use catalog::{ModelCatalog, ModelDescriptor};
pub use cli::Cli;
pub use client::{ClientConfig, ClientError, OllamaClient};
pub use config::Config;
pub use report::{ModelSummary, Report};
