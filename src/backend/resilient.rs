use std::time::Duration;

use async_trait::async_trait;

use crate::error::BackendError;

use super::traits::{AsyncBackend, BlockingBackend};
use super::types::{RawOutput, SamplingParams};

/// Configuration for retry and backoff behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Maximum number of attempts including the first one
    pub max_attempts: usize,
    /// Initial backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Whether to add deterministic jitter to backoff delays
    pub jitter: bool,
}

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 200;
const DEFAULT_MAX_DELAY_MS: u64 = 2_000;

impl ResilienceConfig {
    /// Creates a default configuration with sane values.
    pub fn defaults() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: true,
        }
    }

    fn backoff(&self, attempt_index: usize) -> Duration {
        let mut delay = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt_index.min(16));
        delay = delay.min(self.max_delay_ms);
        if self.jitter {
            let span = (delay / 2).max(1);
            let jitter = ((attempt_index as u64)
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1))
                % span;
            delay = delay.saturating_sub(jitter);
        }
        Duration::from_millis(delay)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Retries transient backend failures with exponential backoff.
///
/// Works for either calling convention: blocking backends sleep the worker
/// thread, async backends await a timer.
pub struct Resilient<B> {
    inner: B,
    cfg: ResilienceConfig,
}

impl<B> Resilient<B> {
    pub fn new(inner: B, cfg: ResilienceConfig) -> Self {
        Self { inner, cfg }
    }

    fn attempts(&self) -> usize {
        self.cfg.max_attempts.max(1)
    }

    /// Decides what to do after `attempt` (0-based) failed with `err`.
    fn on_failure(
        &self,
        name: &str,
        attempt: usize,
        err: BackendError,
    ) -> Result<Duration, BackendError> {
        if !is_retryable(&err) {
            return Err(err);
        }
        if attempt + 1 >= self.attempts() {
            return Err(BackendError::RetryExceeded {
                attempts: self.attempts(),
                last_error: err.to_string(),
            });
        }
        let delay = self.cfg.backoff(attempt);
        log::warn!(
            "{name}: attempt {} failed ({err}), retrying in {delay:?}",
            attempt + 1
        );
        Ok(delay)
    }
}

fn is_retryable(err: &BackendError) -> bool {
    match err {
        BackendError::HttpError(_) => true,
        BackendError::Timeout(_) => true,
        BackendError::ProviderError(_) => true,
        BackendError::ResponseFormatError { .. } => true,
        BackendError::Generic(_) => true,
        BackendError::JsonError(_) => false,
        BackendError::RetryExceeded { .. } => false,
    }
}

impl<B: BlockingBackend> BlockingBackend for Resilient<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<RawOutput, BackendError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(prompt, params) {
                Ok(output) => return Ok(output),
                Err(err) => {
                    let delay = self.on_failure(self.inner.name(), attempt, err)?;
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<B: AsyncBackend> AsyncBackend for Resilient<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<RawOutput, BackendError> {
        let mut attempt = 0;
        loop {
            match self.inner.generate(prompt, params).await {
                Ok(output) => return Ok(output),
                Err(err) => {
                    let delay = self.on_failure(self.inner.name(), attempt, err)?;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
