use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "llm-bench",
    version,
    about = "Few-shot accuracy and latency benchmarks against a text-generation server"
)]
pub struct CliArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand; each one overrides the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct CommonArgs {
    /// Backend label written to the results log
    #[arg(long, global = true)]
    pub backend: Option<String>,
    /// Wire format: sglang or openai
    #[arg(long, global = true)]
    pub api: Option<String>,
    #[arg(long, global = true)]
    pub host: Option<String>,
    #[arg(long, global = true)]
    pub port: Option<u16>,
    #[arg(long, global = true)]
    pub model: Option<String>,
    /// Worker count or batch size
    #[arg(long, global = true)]
    pub parallel: Option<usize>,
    /// Execution mode: pool or batch
    #[arg(long, global = true)]
    pub mode: Option<String>,
    #[arg(long, global = true)]
    pub result_file: Option<PathBuf>,
    #[arg(long, global = true)]
    pub num_gpus: Option<u32>,
    /// Directory for raw-output dumps
    #[arg(long, global = true)]
    pub dump_dir: Option<PathBuf>,
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// C-Eval multiple choice (Chinese)
    Ceval(MultipleChoiceArgs),
    /// MMLU multiple choice (English)
    Mmlu(MultipleChoiceArgs),
    /// CLUEWSC pronoun disambiguation
    Cluewsc(WscArgs),
    /// Print the results log
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct MultipleChoiceArgs {
    /// Directory holding the per-subject CSV files
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,
    /// Training examples loaded per subject
    #[arg(long, default_value_t = 5)]
    pub ntrain: usize,
    /// Number of subjects to evaluate
    #[arg(long, default_value_t = 60)]
    pub nsub: usize,
}

#[derive(Args, Debug)]
pub struct WscArgs {
    #[arg(long, short = 'd', default_value = "cluewsc_data/train.json")]
    pub data_path: PathBuf,
    #[arg(long, default_value_t = 200)]
    pub num_questions: usize,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Only show records for this task
    #[arg(long)]
    pub task: Option<String>,
    /// Only show the most recent N records
    #[arg(long)]
    pub last: Option<usize>,
}
