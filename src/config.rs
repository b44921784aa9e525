use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::ModelCatalog;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    #[serde(default)]
    pub descriptors: ModelCatalog,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64, // Generation request timeout in seconds
    #[serde(default = "default_health_check_timeout")]
    pub health_check_timeout: u64, // Availability check timeout in seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_questions")]
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
    #[serde(default)]
    pub quiet: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    /// Per-module log level overrides (e.g., ["reqwest=warn", "hyper=info"])
    #[serde(default)]
    pub filter: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            health_check_timeout: default_health_check_timeout(),
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            questions: default_questions(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_output_file(),
            quiet: false,
            trace_log: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            filter: Vec::new(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_health_check_timeout() -> u64 {
    5
}

fn default_models() -> Vec<String> {
    [
        "mistral:7b",
        "qwen2:latest",
        "llama3.1:latest",
        "deepseek-r1:7b",
        "llama2:latest",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_questions() -> Vec<String> {
    [
        "¿Es Taiwán un país?",
        "Si un tren eléctrico sale de Madrid a las 10:00 AM y llega a Barcelona a las 2:00 PM, ¿En que dirección se mueve el humo del tren?",
        "Un hombre muere en un accidente, su hijo sobrevive, pero el cirujano dice: No puedo operar a ese hombre, ¡es mi hijo!, explicalo",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_output_file() -> PathBuf {
    PathBuf::from("llm_evaluation_results.csv")
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Config {
    /// Loads the configuration at `path`, or the built-in defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoint.base_url.trim().is_empty() {
            anyhow::bail!("endpoint.base_url must not be empty");
        }

        if self.endpoint.timeout == 0 {
            anyhow::bail!("endpoint.timeout must be greater than 0");
        }

        if self.endpoint.health_check_timeout == 0 {
            anyhow::bail!("endpoint.health_check_timeout must be greater than 0");
        }

        if let Some(index) = self
            .benchmark
            .questions
            .iter()
            .position(|q| q.trim().is_empty())
        {
            anyhow::bail!("benchmark.questions[{}] is empty", index);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_builtin_tables() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.endpoint.base_url, "http://localhost:11434");
        assert_eq!(config.endpoint.timeout, 120);
        assert_eq!(config.endpoint.health_check_timeout, 5);
        assert_eq!(config.benchmark.models.len(), 5);
        assert_eq!(config.benchmark.questions.len(), 3);
        assert_eq!(config.output.file, PathBuf::from("llm_evaluation_results.csv"));

        // Every default model has a descriptor
        for model in &config.benchmark.models {
            assert!(config.descriptors.contains(model), "missing {}", model);
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [endpoint]
            base_url = "http://gpu-box:11434"

            [benchmark]
            models = ["phi3:mini"]

            [descriptors."phi3:mini"]
            size = "3.8B"
            context = "4096"
            type = "Instruct"
            parameters = "3.8B"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.base_url, "http://gpu-box:11434");
        assert_eq!(config.endpoint.timeout, 120);
        assert_eq!(config.benchmark.models, vec!["phi3:mini".to_string()]);
        assert_eq!(config.benchmark.questions.len(), 3);
        // A descriptors table replaces the built-in one
        assert_eq!(config.descriptors.len(), 1);
        assert!(config.descriptors.get("mistral:7b").is_none());
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_validate_rejects_empty_question() {
        let mut config = Config::default();
        config.benchmark.questions.push("   ".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("questions[3]"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.endpoint.timeout = 0;
        assert!(config.validate().is_err());
    }
}
