#[path = "llm-bench/app.rs"]
mod app;
#[path = "llm-bench/args.rs"]
mod args;
#[path = "llm-bench/config/mod.rs"]
mod config;
#[path = "llm-bench/dataset.rs"]
mod dataset;
#[path = "llm-bench/logging.rs"]
mod logging;
#[path = "llm-bench/summary.rs"]
mod summary;
#[path = "llm-bench/tasks.rs"]
mod tasks;

// Plain `main`: the blocking HTTP client must not run inside a Tokio runtime,
// and cooperative batches start their own.
fn main() -> anyhow::Result<()> {
    app::run()
}
