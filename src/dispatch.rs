//! Concurrent execution of prompt requests against a generation backend.
//!
//! Results are written into a pre-allocated arena addressed by each request's
//! `index`, so output position `i` always belongs to the request with index
//! `i`, whatever order the backend completes in.

#[path = "dispatch/mode.rs"]
mod mode;

#[path = "dispatch/slots.rs"]
mod slots;

#[path = "dispatch/pool.rs"]
mod pool;

#[path = "dispatch/batch.rs"]
mod batch;

use std::time::{Duration, Instant};

use crate::backend::{AsyncBackend, GenerationBackend, PromptRequest, RawOutput};
use crate::error::BenchError;

pub use mode::{Concurrency, ExecutionMode};
pub use slots::ResultSlots;

/// Outputs of a completed dispatch, index-aligned with its requests.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub outputs: Vec<RawOutput>,
    /// Wall clock from the first issued request to the last filled slot.
    pub latency: Duration,
}

impl Dispatched {
    /// Sum of reported completion tokens; `None` if no output reported any.
    pub fn completion_tokens(&self) -> Option<u64> {
        self.outputs
            .iter()
            .filter_map(RawOutput::completion_tokens)
            .fold(None, |acc, n| Some(acc.unwrap_or(0) + n))
    }

    /// Generated tokens per second of end-to-end latency.
    pub fn output_throughput(&self) -> Option<f64> {
        let secs = self.latency.as_secs_f64();
        match self.completion_tokens() {
            Some(tokens) if secs > 0.0 => Some(tokens as f64 / secs),
            _ => None,
        }
    }
}

/// Runs every request against `backend` under `mode`.
///
/// The mode must match the backend's calling convention: the worker pool
/// drives blocking backends, cooperative batches drive async backends on a
/// private single-threaded runtime. Call [`dispatch_batched`] instead when
/// already inside a Tokio runtime.
///
/// Blocking backends are always called from pool threads, even with a
/// concurrency of one, never from the caller's thread.
///
/// Fails fast: the first backend error aborts the run and no partial outputs
/// are returned.
pub fn dispatch(
    requests: &[PromptRequest],
    backend: &GenerationBackend,
    concurrency: Concurrency,
    mode: ExecutionMode,
) -> Result<Dispatched, BenchError> {
    validate_requests(requests)?;
    match (mode, backend) {
        (ExecutionMode::WorkerPool, GenerationBackend::Blocking(backend)) => {
            log::info!(
                "dispatching {} requests to {} on {concurrency} workers",
                requests.len(),
                backend.name()
            );
            let slots = ResultSlots::new(requests.len());
            let start = Instant::now();
            pool::run_pool(requests, backend.as_ref(), concurrency, &slots)?;
            finish(slots, start.elapsed())
        }
        (ExecutionMode::CooperativeBatch, GenerationBackend::Async(backend)) => {
            if tokio::runtime::Handle::try_current().is_ok() {
                return Err(BenchError::config(
                    "cooperative-batch dispatch was called inside an async runtime; use dispatch_batched",
                ));
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(batched(requests, backend.as_ref(), concurrency))
        }
        (mode, backend) => Err(BenchError::config(format!(
            "{mode} mode cannot drive {} backend '{}'",
            backend.convention(),
            backend.name()
        ))),
    }
}

/// Cooperative-batch dispatch for callers already running on a Tokio runtime.
pub async fn dispatch_batched(
    requests: &[PromptRequest],
    backend: &dyn AsyncBackend,
    concurrency: Concurrency,
) -> Result<Dispatched, BenchError> {
    validate_requests(requests)?;
    batched(requests, backend, concurrency).await
}

async fn batched(
    requests: &[PromptRequest],
    backend: &dyn AsyncBackend,
    concurrency: Concurrency,
) -> Result<Dispatched, BenchError> {
    log::info!(
        "dispatching {} requests to {} in batches of {concurrency}",
        requests.len(),
        backend.name()
    );
    let slots = ResultSlots::new(requests.len());
    let start = Instant::now();
    batch::run_batches(requests, backend, concurrency, &slots).await?;
    finish(slots, start.elapsed())
}

fn finish(slots: ResultSlots, latency: Duration) -> Result<Dispatched, BenchError> {
    let outputs = slots.into_outputs()?;
    log::debug!("dispatch finished in {latency:?}");
    Ok(Dispatched { outputs, latency })
}

/// Indices must be a permutation of `0..len` and every request well-formed.
fn validate_requests(requests: &[PromptRequest]) -> Result<(), BenchError> {
    let mut seen = vec![false; requests.len()];
    for request in requests {
        match seen.get_mut(request.index) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => {
                return Err(BenchError::config(format!(
                    "duplicate request index {}",
                    request.index
                )))
            }
            None => {
                return Err(BenchError::config(format!(
                    "request index {} out of range for {} requests",
                    request.index,
                    requests.len()
                )))
            }
        }
        request.sampling_params.validate()?;
    }
    Ok(())
}
