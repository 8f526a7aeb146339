use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BenchError;

/// Decoding parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl SamplingParams {
    /// Temperature 0 with the given generation length.
    pub fn greedy(max_tokens: u32) -> Self {
        Self {
            temperature: 0.0,
            max_tokens,
            stop: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_stop(mut self, stop: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stop = Some(stop.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(BenchError::config(format!(
                "temperature must be a finite non-negative number, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(BenchError::config("max_tokens must be at least 1"));
        }
        if let Some(stop) = &self.stop {
            if stop.iter().any(String::is_empty) {
                return Err(BenchError::config("stop sequences must not be empty"));
            }
        }
        Ok(())
    }
}

/// A prompt bound to its position in the sequence of test items.
///
/// `index` is the only key used to pair the request with its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub index: usize,
    pub text: String,
    pub sampling_params: SamplingParams,
}

/// Text generated for one request, plus whatever metadata the engine returned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawOutput {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl RawOutput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Number of generated tokens, when the engine reported it.
    pub fn completion_tokens(&self) -> Option<u64> {
        self.metadata
            .as_ref()?
            .get("completion_tokens")
            .and_then(Value::as_u64)
    }
}
