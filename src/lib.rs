//! Few-shot accuracy and latency benchmarks for text-generation backends.
//!
//! A run builds budget-bounded few-shot prompts, dispatches them to a
//! backend through a worker pool (blocking backends) or cooperative batches
//! (async backends), scores the outputs by exact match and appends one line
//! to a JSON-lines results log.

pub mod aggregate;
pub mod backend;
pub mod dispatch;
pub mod error;
pub mod harness;
pub mod prompt;
pub mod report;
pub mod tokenizer;

pub use aggregate::{score, Score};
pub use backend::{AsyncBackend, BlockingBackend, GenerationBackend, RawOutput, SamplingParams};
pub use dispatch::{dispatch, dispatch_batched, Concurrency, Dispatched, ExecutionMode};
pub use error::{BackendError, BenchError};
pub use harness::{Evaluation, Harness, HarnessConfig, TaskRun};
pub use prompt::{Example, FewShotPromptBuilder, MaxShots, PromptTemplate};
pub use report::{BenchmarkResult, ResultsLog};
pub use tokenizer::{Encoding, TiktokenCounter, TokenCounter};
