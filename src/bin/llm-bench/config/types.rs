use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use llm_bench::backend::{ApiFlavor, ResilienceConfig};
use llm_bench::ExecutionMode;

const DEFAULT_PARALLEL: usize = 64;
const DEFAULT_HOST: &str = "http://127.0.0.1";
const DEFAULT_PORT: u16 = 30000;
const DEFAULT_TOKEN_BUDGET: usize = 1536;
const DEFAULT_ENCODING: &str = "cl100k_base";
const DEFAULT_RESULT_FILE: &str = "result.jsonl";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BenchConfig {
    pub dispatch: DispatchConfig,
    pub prompt: PromptConfig,
    pub backend: BackendConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub concurrency: usize,
    pub mode: ExecutionMode,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_PARALLEL,
            mode: ExecutionMode::WorkerPool,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptConfig {
    /// `-1` keeps every loaded training example.
    pub max_shots: i64,
    pub token_budget: usize,
    pub encoding: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_shots: -1,
            token_budget: DEFAULT_TOKEN_BUDGET,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Label for logs and results; defaults to the API flavour.
    pub name: Option<String>,
    pub api: ApiFlavor,
    pub host: String,
    pub port: u16,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry: RetryConfig,
}

impl BackendConfig {
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }

    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.api.to_string())
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: None,
            api: ApiFlavor::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model: None,
            timeout_seconds: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Backend-side retries. One attempt means no retry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl RetryConfig {
    pub fn enabled(&self) -> bool {
        self.max_attempts > 1
    }

    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig {
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
            jitter: self.jitter,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let defaults = ResilienceConfig::defaults();
        Self {
            max_attempts: 1,
            base_delay_ms: defaults.base_delay_ms,
            max_delay_ms: defaults.max_delay_ms,
            jitter: defaults.jitter,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub result_file: PathBuf,
    pub dump_dir: Option<PathBuf>,
    pub num_gpus: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_file: PathBuf::from(DEFAULT_RESULT_FILE),
            dump_dir: None,
            num_gpus: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log file; stderr when unset.
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
        }
    }
}
