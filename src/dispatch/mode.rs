use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// Upper bound on simultaneously in-flight requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency(NonZeroUsize);

impl Concurrency {
    pub fn get(self) -> usize {
        self.0.get()
    }

    pub fn sequential() -> Self {
        Self(NonZeroUsize::MIN)
    }
}

impl TryFrom<usize> for Concurrency {
    type Error = BenchError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let Some(n) = NonZeroUsize::new(value) else {
            return Err(BenchError::config("concurrency must be at least 1"));
        };
        Ok(Self(n))
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How requests are scheduled against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Blocking workers pulling requests from a shared cursor.
    #[default]
    WorkerPool,
    /// Contiguous batches issued concurrently on one thread, one batch at a time.
    CooperativeBatch,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::WorkerPool => "worker-pool",
            ExecutionMode::CooperativeBatch => "cooperative-batch",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "worker-pool" | "pool" | "thread" | "threads" => Ok(ExecutionMode::WorkerPool),
            "cooperative-batch" | "batch" | "cooperative" | "async" => {
                Ok(ExecutionMode::CooperativeBatch)
            }
            other => Err(BenchError::config(format!(
                "unsupported execution mode '{other}'"
            ))),
        }
    }
}
