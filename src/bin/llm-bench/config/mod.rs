mod error;
mod load;
mod overrides;
mod types;

pub use load::load_config;
pub use types::{BenchConfig, LoggingConfig};
