//! HTTP clients for serving engines.
//!
//! Two wire formats are spoken: the SGLang-native `/generate` endpoint and the
//! OpenAI-compatible `/v1/completions` endpoint (vLLM, TGI, llama.cpp server).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BackendError, BenchError};

use super::traits::{AsyncBackend, BlockingBackend};
use super::types::{RawOutput, SamplingParams};

/// Wire format of the serving endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// `POST /generate` with `sampling_params`.
    #[default]
    Sglang,
    /// `POST /v1/completions`.
    OpenAi,
}

impl ApiFlavor {
    fn path(&self) -> &'static str {
        match self {
            ApiFlavor::Sglang => "/generate",
            ApiFlavor::OpenAi => "/v1/completions",
        }
    }
}

impl fmt::Display for ApiFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFlavor::Sglang => f.write_str("sglang"),
            ApiFlavor::OpenAi => f.write_str("openai"),
        }
    }
}

impl FromStr for ApiFlavor {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sglang" | "srt" | "native" | "generate" => Ok(ApiFlavor::Sglang),
            "openai" | "vllm" | "completions" => Ok(ApiFlavor::OpenAi),
            other => Err(BenchError::config(format!("unknown API flavor '{other}'"))),
        }
    }
}

/// Connection settings shared by the blocking and async clients.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Label reported in logs and results.
    pub name: String,
    /// Scheme, host and port, e.g. `http://127.0.0.1:30000`.
    pub base_url: String,
    pub flavor: ApiFlavor,
    /// Model field for OpenAI-compatible servers.
    pub model: Option<String>,
    /// Per-call deadline.
    pub timeout: Option<Duration>,
}

impl HttpBackendConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            flavor: ApiFlavor::default(),
            model: None,
            timeout: None,
        }
    }

    pub fn flavor(mut self, flavor: ApiFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.flavor.path())
    }

    fn request_body<'a>(&'a self, prompt: &'a str, params: &'a SamplingParams) -> RequestBody<'a> {
        let stop = params.stop.as_deref();
        match self.flavor {
            ApiFlavor::Sglang => RequestBody::Native(NativeRequest {
                text: prompt,
                sampling_params: NativeSampling {
                    temperature: params.temperature,
                    max_new_tokens: params.max_tokens,
                    stop,
                },
            }),
            ApiFlavor::OpenAi => RequestBody::Completion(CompletionRequest {
                model: self.model.as_deref(),
                prompt,
                temperature: params.temperature,
                max_tokens: params.max_tokens,
                stop,
            }),
        }
    }

    fn parse_response(&self, status: StatusCode, body: String) -> Result<RawOutput, BackendError> {
        log::debug!("{} HTTP status: {status}", self.name);
        if !status.is_success() {
            return Err(BackendError::ResponseFormatError {
                message: format!("{} returned error status: {status}", self.name),
                raw_response: body,
            });
        }
        let format_error = |message: String, raw_response: String| {
            BackendError::ResponseFormatError {
                message,
                raw_response,
            }
        };
        match self.flavor {
            ApiFlavor::Sglang => match serde_json::from_str::<NativeResponse>(&body) {
                Ok(resp) => Ok(RawOutput {
                    text: resp.text,
                    metadata: resp.meta_info,
                }),
                Err(e) => Err(format_error(
                    format!("Failed to decode {} response: {e}", self.name),
                    body,
                )),
            },
            ApiFlavor::OpenAi => match serde_json::from_str::<CompletionResponse>(&body) {
                Ok(resp) => match resp.choices.into_iter().next() {
                    Some(choice) => Ok(RawOutput {
                        text: choice.text,
                        metadata: resp.usage,
                    }),
                    None => Err(format_error(
                        format!("{} response has no choices", self.name),
                        body,
                    )),
                },
                Err(e) => Err(format_error(
                    format!("Failed to decode {} response: {e}", self.name),
                    body,
                )),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestBody<'a> {
    Native(NativeRequest<'a>),
    Completion(CompletionRequest<'a>),
}

#[derive(Serialize)]
struct NativeRequest<'a> {
    text: &'a str,
    sampling_params: NativeSampling<'a>,
}

#[derive(Serialize)]
struct NativeSampling<'a> {
    temperature: f32,
    max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct NativeResponse {
    text: String,
    #[serde(default)]
    meta_info: Option<Map<String, Value>>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Awaitable HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: HttpBackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    pub fn with_client(client: reqwest::Client, config: HttpBackendConfig) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }
}

#[async_trait]
impl AsyncBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<RawOutput, BackendError> {
        let response = self
            .client
            .post(self.config.endpoint())
            .json(&self.config.request_body(prompt, params))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        self.config.parse_response(status, body)
    }
}

/// Blocking HTTP backend for the worker-pool execution model.
///
/// Must not be used from inside an async runtime.
#[derive(Debug, Clone)]
pub struct BlockingHttpBackend {
    config: HttpBackendConfig,
    client: reqwest::blocking::Client,
}

impl BlockingHttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }
}

impl BlockingBackend for BlockingHttpBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<RawOutput, BackendError> {
        let response = self
            .client
            .post(self.config.endpoint())
            .json(&self.config.request_body(prompt, params))
            .send()?;
        let status = response.status();
        let body = response.text()?;
        self.config.parse_response(status, body)
    }
}
