//! Few-shot prompt assembly under a token budget.

#[path = "prompt/example.rs"]
mod example;

#[path = "prompt/template.rs"]
mod template;

#[path = "prompt/builder.rs"]
mod builder;

pub use builder::{FewShotPrompt, FewShotPromptBuilder};
pub use example::{Example, MaxShots};
pub use template::{format_subject, PromptTemplate};
