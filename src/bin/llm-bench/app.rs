use std::time::Duration;

use clap::Parser;

use llm_bench::backend::{BlockingHttpBackend, HttpBackend, HttpBackendConfig, Resilient};
use llm_bench::{
    BenchmarkResult, Concurrency, Encoding, ExecutionMode, GenerationBackend, Harness,
    HarnessConfig, MaxShots, ResultsLog, TiktokenCounter,
};

use crate::args::{CliArgs, Command, ReportArgs};
use crate::config::{load_config, BenchConfig};
use crate::logging::init_logging;
use crate::summary;
use crate::tasks::{self, MultipleChoiceSuite, PromptSettings};

pub fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.common.config.clone())?;
    let mut config = loaded.config;
    config.apply_args(&args.common)?;
    let _logger = init_logging(&config.logging)?;
    if !loaded.config_exists {
        if let Some(path) = &loaded.path {
            log::debug!("no config file at {}, using defaults", path.display());
        }
    }

    let results_log = ResultsLog::new(&config.output.result_file);
    let result = match &args.command {
        Command::Report(report) => return print_report(&results_log, report),
        Command::Ceval(mc) => {
            run_multiple_choice(&config, results_log, MultipleChoiceSuite::Ceval, mc)?
        }
        Command::Mmlu(mc) => {
            run_multiple_choice(&config, results_log, MultipleChoiceSuite::Mmlu, mc)?
        }
        Command::Cluewsc(wsc) => {
            let backend = build_backend(&config)?;
            let harness = build_harness(&config, results_log, &backend)?;
            tasks::run_cluewsc(&harness, &backend, wsc)?
        }
    };
    print_result(&result);
    Ok(())
}

fn run_multiple_choice(
    config: &BenchConfig,
    results_log: ResultsLog,
    suite: MultipleChoiceSuite,
    args: &crate::args::MultipleChoiceArgs,
) -> anyhow::Result<BenchmarkResult> {
    let encoding: Encoding = config.prompt.encoding.parse()?;
    let counter = TiktokenCounter::new(encoding)?;
    let prompt = PromptSettings {
        counter: &counter,
        max_shots: MaxShots::from_arg(config.prompt.max_shots)?,
        token_budget: config.prompt.token_budget,
    };
    let backend = build_backend(config)?;
    let harness = build_harness(config, results_log, &backend)?;
    Ok(tasks::run_multiple_choice(
        &harness, &backend, suite, &prompt, args,
    )?)
}

/// Picks the client that matches the execution mode's calling convention.
fn build_backend(config: &BenchConfig) -> anyhow::Result<GenerationBackend> {
    let settings = &config.backend;
    let mut http = HttpBackendConfig::new(settings.label(), settings.base_url()).flavor(settings.api);
    if let Some(model) = &settings.model {
        http = http.model(model.clone());
    }
    if let Some(secs) = settings.timeout_seconds {
        http = http.timeout(Duration::from_secs(secs));
    }
    log::info!(
        "backend {} ({}) at {}",
        http.name,
        http.flavor,
        http.base_url
    );

    let retry = settings.retry.enabled().then(|| settings.retry.resilience());
    let backend = match config.dispatch.mode {
        ExecutionMode::WorkerPool => {
            let client = BlockingHttpBackend::new(http)?;
            match retry {
                Some(cfg) => GenerationBackend::blocking(Resilient::new(client, cfg)),
                None => GenerationBackend::blocking(client),
            }
        }
        ExecutionMode::CooperativeBatch => {
            let client = HttpBackend::new(http)?;
            match retry {
                Some(cfg) => GenerationBackend::awaitable(Resilient::new(client, cfg)),
                None => GenerationBackend::awaitable(client),
            }
        }
    };
    Ok(backend)
}

fn build_harness(
    config: &BenchConfig,
    results_log: ResultsLog,
    backend: &GenerationBackend,
) -> anyhow::Result<Harness> {
    let dump_path = config
        .output
        .dump_dir
        .as_ref()
        .map(|dir| dir.join(format!("tmp_output_{}.txt", backend.name())));
    Ok(Harness::new(HarnessConfig {
        concurrency: Concurrency::try_from(config.dispatch.concurrency)?,
        mode: config.dispatch.mode,
        num_gpus: config.output.num_gpus,
        results_log,
        dump_path,
    }))
}

fn print_result(result: &BenchmarkResult) {
    println!("Task: {}", result.task_name);
    println!("Backend: {}", result.backend_name);
    println!("Accuracy: {:.3}", result.accuracy);
    println!("Latency: {:.3} s", result.latency_seconds);
    println!("Requests: {}", result.num_requests);
    if let Some(throughput) = result.extra.get("output_throughput").and_then(|v| v.as_f64()) {
        println!("Output throughput: {throughput:.3} token/s");
    }
}

fn print_report(results_log: &ResultsLog, args: &ReportArgs) -> anyhow::Result<()> {
    let records = results_log.read_all()?;
    let selected = summary::select(&records, args);
    if selected.is_empty() {
        println!("No results in {}", results_log.path().display());
        return Ok(());
    }
    print!("{}", summary::render_table(&selected));
    Ok(())
}
