//! Token counting used to keep few-shot prompts inside a budget.

use std::fmt;
use std::str::FromStr;

use tiktoken_rs::{cl100k_base, o200k_base, p50k_base, r50k_base, CoreBPE};

use crate::error::BenchError;

/// Deterministic, stateless token count of a string.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count(&self, text: &str) -> usize {
        self(text)
    }
}

/// BPE vocabularies available for budget estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// GPT-4, GPT-3.5-turbo
    #[default]
    Cl100kBase,
    /// GPT-4o family
    O200kBase,
    /// Codex, text-davinci-002/003
    P50kBase,
    /// GPT-3 davinci
    R50kBase,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Cl100kBase => "cl100k_base",
            Encoding::O200kBase => "o200k_base",
            Encoding::P50kBase => "p50k_base",
            Encoding::R50kBase => "r50k_base",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k_base" | "gpt-3.5-turbo" | "gpt-4" => Ok(Encoding::Cl100kBase),
            "o200k_base" | "gpt-4o" => Ok(Encoding::O200kBase),
            "p50k_base" => Ok(Encoding::P50kBase),
            "r50k_base" => Ok(Encoding::R50kBase),
            other => Err(BenchError::Tokenizer(format!("unknown encoding '{other}'"))),
        }
    }
}

/// Tiktoken-backed counter.
pub struct TiktokenCounter {
    bpe: CoreBPE,
    encoding: Encoding,
}

impl TiktokenCounter {
    pub fn new(encoding: Encoding) -> Result<Self, BenchError> {
        let bpe = match encoding {
            Encoding::Cl100kBase => cl100k_base(),
            Encoding::O200kBase => o200k_base(),
            Encoding::P50kBase => p50k_base(),
            Encoding::R50kBase => r50k_base(),
        }
        .map_err(|e| BenchError::Tokenizer(format!("failed to load {encoding}: {e}")))?;
        Ok(Self { bpe, encoding })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

impl fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("encoding", &self.encoding)
            .finish()
    }
}
