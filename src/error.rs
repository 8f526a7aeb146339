use thiserror::Error;

/// Errors raised at the generation backend boundary for a single request.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// The request did not complete before the per-call deadline
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// Errors reported by the serving engine
    #[error("Provider error: {0}")]
    ProviderError(String),
    /// Response body did not match the expected wire format
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// Generic error
    #[error("Generic error: {0}")]
    Generic(String),
    /// Retry attempts exceeded
    #[error("Retry attempts exceeded after {attempts} tries: {last_error}")]
    RetryExceeded { attempts: usize, last_error: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(err.to_string())
        } else {
            BackendError::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

/// Errors that terminate a benchmark run.
///
/// None of these leave a line in the results log: a run either completes
/// and appends exactly one record, or fails with one of these.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid sampling parameters, concurrency, mode or request set.
    /// Raised before any request is issued.
    #[error("Configuration error: {0}")]
    Config(String),
    /// A single generation call failed and the dispatch was aborted.
    #[error("Backend error on request {index}: {source}")]
    Backend {
        index: usize,
        #[source]
        source: BackendError,
    },
    /// Result count does not match label count.
    #[error("Shape mismatch: {results} results for {labels} labels")]
    ShapeMismatch { results: usize, labels: usize },
    /// A result slot was still empty after dispatch returned.
    #[error("Result slot {index} was never filled")]
    MissingResult { index: usize },
    /// A result was written to a slot that was already filled or does not exist.
    #[error("Result slot {index} rejected a second or out-of-range write")]
    RejectedResult { index: usize },
    /// Tokenizer could not be constructed
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
    /// Dataset could not be read or is malformed
    #[error("Dataset error: {0}")]
    Dataset(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        BenchError::Config(msg.into())
    }
}
