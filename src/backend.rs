//! Generation backends and the request/response types they exchange.

#[path = "backend/types.rs"]
mod types;

#[path = "backend/traits.rs"]
mod traits;

#[path = "backend/http.rs"]
mod http;

#[path = "backend/resilient.rs"]
mod resilient;

pub use http::{ApiFlavor, BlockingHttpBackend, HttpBackend, HttpBackendConfig};
pub use resilient::{ResilienceConfig, Resilient};
pub use traits::{AsyncBackend, BlockingBackend, CallingConvention, GenerationBackend};
pub use types::{PromptRequest, RawOutput, SamplingParams};
