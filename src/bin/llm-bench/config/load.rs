use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::types::BenchConfig;

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: BenchConfig,
    pub path: Option<PathBuf>,
    pub config_exists: bool,
}

/// Reads the config file; a missing file yields the defaults.
pub fn load_config(path_override: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let Some(path) = path_override.or_else(default_config_file) else {
        return Ok(LoadedConfig {
            config: BenchConfig::default(),
            path: None,
            config_exists: false,
        });
    };
    let (config, config_exists) = read_config(&path)?;
    Ok(LoadedConfig {
        config,
        path: Some(path),
        config_exists,
    })
}

fn read_config(path: &Path) -> Result<(BenchConfig, bool), ConfigError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok((toml::from_str(&contents)?, true)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Ok((BenchConfig::default(), false))
        }
        Err(err) => Err(ConfigError::Io(err)),
    }
}

fn default_config_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("llm-bench").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_bench::backend::ApiFlavor;
    use llm_bench::ExecutionMode;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(dir.path().join("absent.toml"))).unwrap();
        assert!(!loaded.config_exists);
        assert_eq!(loaded.config.dispatch.concurrency, 64);
        assert_eq!(loaded.config.prompt.token_budget, 1536);
        assert_eq!(loaded.config.backend.base_url(), "http://127.0.0.1:30000");
        assert_eq!(loaded.config.backend.retry.max_attempts, 1);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[dispatch]
mode = "cooperative-batch"

[backend]
api = "openai"
port = 8000
model = "llama"

[backend.retry]
max_attempts = 4
"#,
        )
        .unwrap();
        let loaded = load_config(Some(path)).unwrap();
        let config = loaded.config;
        assert!(loaded.config_exists);
        assert_eq!(config.dispatch.mode, ExecutionMode::CooperativeBatch);
        assert_eq!(config.dispatch.concurrency, 64);
        assert_eq!(config.backend.api, ApiFlavor::OpenAi);
        assert_eq!(config.backend.label(), "openai");
        assert_eq!(config.backend.base_url(), "http://127.0.0.1:8000");
        assert!(config.backend.retry.enabled());
        assert_eq!(config.backend.retry.base_delay_ms, 200);
        assert_eq!(config.prompt.max_shots, -1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[dispatch]\nconcurrency = \"many\"\n").unwrap();
        assert!(matches!(load_config(Some(path)), Err(ConfigError::Toml(_))));
    }
}
