// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub input: InputConfig,
    pub service: ServiceConfig,
    pub retry: RetryConfig,
    pub chunking: ChunkingConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub source_dir: PathBuf,
    pub schema_path: PathBuf,
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub max_in_flight: usize,
    pub requests_per_second: f64,
    pub burst: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub corrective_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    pub budget_chars: usize,
    pub overlap_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub parallel_documents: usize,
    pub document_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub table_path: PathBuf,
    pub report_path: PathBuf,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PDFSIFT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if config.service.api_key.is_none() {
            config.service.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            input: InputConfig {
                source_dir: PathBuf::from("./documents"),
                schema_path: PathBuf::from("config/schema.yaml"),
                skip_patterns: vec![],
                max_file_size_mb: 50,
            },
            service: ServiceConfig {
                endpoint: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key: None,
                request_timeout_secs: 120,
                max_in_flight: 8,
                requests_per_second: 2.0,
                burst: 4,
            },
            retry: RetryConfig {
                max_attempts: 4,
                corrective_attempts: 1,
                backoff_base_ms: 500,
                backoff_cap_ms: 30_000,
            },
            chunking: ChunkingConfig {
                budget_chars: 12_000,
                overlap_chars: 200,
            },
            pipeline: PipelineConfig {
                parallel_documents: 4,
                document_timeout_secs: 600,
            },
            output: OutputConfig {
                table_path: PathBuf::from("./out/records.csv"),
                report_path: PathBuf::from("./out/report.json"),
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.parallel_documents == 0 {
            return Err(PipelineError::Config(
                "parallel_documents must be greater than 0".to_string(),
            ));
        }

        if self.chunking.budget_chars == 0 {
            return Err(PipelineError::Config(
                "budget_chars must be greater than 0".to_string(),
            ));
        }

        if self.chunking.overlap_chars >= self.chunking.budget_chars {
            return Err(PipelineError::Config(
                "overlap_chars must be smaller than budget_chars".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(PipelineError::Config(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if self.service.max_in_flight == 0 {
            return Err(PipelineError::Config(
                "max_in_flight must be greater than 0".to_string(),
            ));
        }

        if self.service.requests_per_second <= 0.0 {
            return Err(PipelineError::Config(
                "requests_per_second must be positive".to_string(),
            ));
        }

        if self.service.burst == 0 {
            return Err(PipelineError::Config(
                "burst must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// API key is only mandatory once the pipeline actually talks to the
    /// service; `inspect` and `schema` commands run without one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.service
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Config(
                    "missing service credentials: set service.api_key, \
                     PDFSIFT__SERVICE__API_KEY, or OPENAI_API_KEY"
                        .to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default_config();
        config.pipeline.parallel_documents = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let mut config = Config::default_config();
        config.chunking.budget_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlap_must_be_below_budget() {
        let mut config = Config::default_config();
        config.chunking.budget_chars = 100;
        config.chunking.overlap_chars = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = Config::default_config();
        let err = config.require_api_key().unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
