use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BackendError;

use super::types::{RawOutput, SamplingParams};

/// Backend whose `generate` blocks the calling thread.
pub trait BlockingBackend: Send + Sync {
    /// Label used in logs and in the results record.
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<RawOutput, BackendError>;
}

/// Backend whose `generate` is awaitable.
#[async_trait]
pub trait AsyncBackend: Send + Sync {
    /// Label used in logs and in the results record.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<RawOutput, BackendError>;
}

/// Calling convention of a [`GenerationBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingConvention {
    Blocking,
    Async,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingConvention::Blocking => f.write_str("blocking"),
            CallingConvention::Async => f.write_str("async"),
        }
    }
}

/// A backend in one of the two calling conventions.
#[derive(Clone)]
pub enum GenerationBackend {
    Blocking(Arc<dyn BlockingBackend>),
    Async(Arc<dyn AsyncBackend>),
}

impl GenerationBackend {
    pub fn blocking(backend: impl BlockingBackend + 'static) -> Self {
        GenerationBackend::Blocking(Arc::new(backend))
    }

    pub fn awaitable(backend: impl AsyncBackend + 'static) -> Self {
        GenerationBackend::Async(Arc::new(backend))
    }

    pub fn name(&self) -> &str {
        match self {
            GenerationBackend::Blocking(backend) => backend.name(),
            GenerationBackend::Async(backend) => backend.name(),
        }
    }

    pub fn convention(&self) -> CallingConvention {
        match self {
            GenerationBackend::Blocking(_) => CallingConvention::Blocking,
            GenerationBackend::Async(_) => CallingConvention::Async,
        }
    }
}

impl fmt::Debug for GenerationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationBackend")
            .field("name", &self.name())
            .field("convention", &self.convention())
            .finish()
    }
}
