use flexi_logger::{FileSpec, Logger, LoggerHandle};

use crate::config::LoggingConfig;

/// Starts the logger; the handle must outlive the run.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(&config.level)?;
    let handle = match &config.path {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let basename = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("llm-bench")
                .to_string();
            let mut spec = FileSpec::default().basename(basename).suppress_timestamp();
            if let Some(directory) = directory {
                spec = spec.directory(directory);
            }
            logger.log_to_file(spec).append().start()?
        }
        None => logger.log_to_stderr().start()?,
    };
    Ok(handle)
}
