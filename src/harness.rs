//! End-to-end benchmark runs: dispatch, score, report.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::aggregate::{score, Score};
use crate::backend::{GenerationBackend, PromptRequest};
use crate::dispatch::{dispatch, Concurrency, Dispatched, ExecutionMode};
use crate::error::BenchError;
use crate::report::{dump_outputs, BenchmarkResult, ResultsLog};

/// Settings shared by every task run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub concurrency: Concurrency,
    pub mode: ExecutionMode,
    pub num_gpus: u32,
    pub results_log: ResultsLog,
    /// Where to write the raw-output dump, if anywhere.
    pub dump_path: Option<PathBuf>,
}

/// Scored outputs of one dispatch (or several merged ones).
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub score: Score,
    pub dispatched: Dispatched,
}

impl Evaluation {
    pub fn num_requests(&self) -> usize {
        self.dispatched.outputs.len()
    }

    /// Combines per-subject evaluations: correctness concatenated, latency summed.
    pub fn merge(parts: impl IntoIterator<Item = Evaluation>) -> Self {
        let mut scores = Vec::new();
        let mut latency = Duration::ZERO;
        let mut outputs = Vec::new();
        for part in parts {
            scores.push(part.score);
            latency += part.dispatched.latency;
            outputs.extend(part.dispatched.outputs);
        }
        Self {
            score: Score::merge(scores),
            dispatched: Dispatched { outputs, latency },
        }
    }
}

/// A single-shot task: requests, gold labels and how to read an answer.
pub struct TaskRun<'a> {
    pub task: String,
    pub requests: Vec<PromptRequest>,
    pub labels: Vec<String>,
    pub normalizer: &'a dyn Fn(&str) -> String,
    /// Run parameters recorded under `other`.
    pub params: Map<String, Value>,
}

pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Dispatches `requests` and scores the outputs. Nothing is written.
    pub fn evaluate<L: AsRef<str>>(
        &self,
        requests: &[PromptRequest],
        labels: &[L],
        normalizer: &dyn Fn(&str) -> String,
        backend: &GenerationBackend,
    ) -> Result<Evaluation, BenchError> {
        if requests.len() != labels.len() {
            return Err(BenchError::ShapeMismatch {
                results: requests.len(),
                labels: labels.len(),
            });
        }
        let dispatched = dispatch(requests, backend, self.config.concurrency, self.config.mode)?;
        let score = score(&dispatched.outputs, labels, normalizer)?;
        log::info!(
            "accuracy {:.3}, latency {:.2}s, #q: {}",
            score.accuracy,
            dispatched.latency.as_secs_f64(),
            requests.len()
        );
        Ok(Evaluation { score, dispatched })
    }

    /// Writes the optional dump and appends exactly one results-log line.
    pub fn record(
        &self,
        task: &str,
        backend: &GenerationBackend,
        evaluation: &Evaluation,
        params: Map<String, Value>,
    ) -> Result<BenchmarkResult, BenchError> {
        if let Some(path) = &self.config.dump_path {
            let texts = evaluation.dispatched.outputs.iter().map(|o| o.text.as_str());
            dump_outputs(path, texts)?;
        }

        let mut extra = params;
        extra.insert("parallel".into(), self.config.concurrency.get().into());
        extra.insert("mode".into(), self.config.mode.as_str().into());
        if let Some(throughput) = evaluation.dispatched.output_throughput() {
            log::info!("output throughput {throughput:.3} token/s");
            extra.insert("output_throughput".into(), throughput.into());
        }

        let result = BenchmarkResult {
            task_name: task.to_string(),
            backend_name: backend.name().to_string(),
            num_gpus: self.config.num_gpus,
            latency_seconds: evaluation.dispatched.latency.as_secs_f64(),
            accuracy: evaluation.score.accuracy,
            num_requests: evaluation.num_requests(),
            extra,
        };
        self.config.results_log.append(&result)?;
        log::info!(
            "{task}: accuracy {:.3}, latency {:.3}s, {} requests",
            result.accuracy,
            result.latency_seconds,
            result.num_requests
        );
        Ok(result)
    }

    /// Evaluates and records a task in one go.
    pub fn run(
        &self,
        task: TaskRun<'_>,
        backend: &GenerationBackend,
    ) -> Result<BenchmarkResult, BenchError> {
        let evaluation = self.evaluate(&task.requests, &task.labels, task.normalizer, backend)?;
        self.record(&task.task, backend, &evaluation, task.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::normalize;
    use crate::backend::{BlockingBackend, RawOutput, SamplingParams};
    use crate::error::BackendError;
    use std::fs;

    /// Answers "A" except for prompts listed in `wrong`, which get "B".
    struct Grader {
        wrong: Vec<&'static str>,
        fail: Option<&'static str>,
    }

    impl BlockingBackend for Grader {
        fn name(&self) -> &str {
            "grader"
        }

        fn generate(&self, prompt: &str, _: &SamplingParams) -> Result<RawOutput, BackendError> {
            if self.fail == Some(prompt) {
                return Err(BackendError::HttpError("connection reset".into()));
            }
            let answer = if self.wrong.contains(&prompt) { " B" } else { " A" };
            Ok(RawOutput::new(answer).with_metadata("completion_tokens", 1))
        }
    }

    fn requests(prompts: &[&str]) -> Vec<PromptRequest> {
        prompts
            .iter()
            .enumerate()
            .map(|(index, text)| PromptRequest {
                index,
                text: text.to_string(),
                sampling_params: SamplingParams::greedy(1),
            })
            .collect()
    }

    fn harness(dir: &std::path::Path, dump: bool) -> Harness {
        Harness::new(HarnessConfig {
            concurrency: Concurrency::try_from(2).unwrap(),
            mode: ExecutionMode::WorkerPool,
            num_gpus: 1,
            results_log: ResultsLog::new(dir.join("result.jsonl")),
            dump_path: dump.then(|| dir.join("tmp_output_grader.txt")),
        })
    }

    fn task(prompts: &[&str], labels: &[&str]) -> TaskRun<'static> {
        TaskRun {
            task: "mcq".into(),
            requests: requests(prompts),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            normalizer: &normalize::first_char,
            params: Map::new(),
        }
    }

    #[test]
    fn run_appends_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), true);
        let backend = GenerationBackend::blocking(Grader {
            wrong: vec!["q3"],
            fail: None,
        });

        let result = harness
            .run(task(&["q1", "q2", "q3"], &["A", "A", "A"]), &backend)
            .unwrap();
        assert_eq!(result.backend_name, "grader");
        assert_eq!(result.num_requests, 3);
        assert!((result.accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.extra["parallel"], 2);
        assert_eq!(result.extra["mode"], "worker-pool");
        assert!(result.extra.contains_key("output_throughput"));

        let records = harness.config().results_log.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].task_name, "mcq");

        let dump = fs::read_to_string(dir.path().join("tmp_output_grader.txt")).unwrap();
        assert!(dump.contains(" 2 "));
    }

    #[test]
    fn backend_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), true);
        let backend = GenerationBackend::blocking(Grader {
            wrong: Vec::new(),
            fail: Some("q2"),
        });

        let err = harness
            .run(task(&["q1", "q2", "q3"], &["A", "A", "A"]), &backend)
            .unwrap_err();
        assert!(matches!(err, BenchError::Backend { index: 1, .. }));
        assert!(!dir.path().join("result.jsonl").exists());
        assert!(!dir.path().join("tmp_output_grader.txt").exists());
    }

    #[test]
    fn label_count_is_checked_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), false);
        let backend = GenerationBackend::blocking(Grader {
            wrong: Vec::new(),
            fail: Some("q1"),
        });

        let err = harness
            .run(task(&["q1", "q2"], &["A"]), &backend)
            .unwrap_err();
        assert!(matches!(
            err,
            BenchError::ShapeMismatch {
                results: 2,
                labels: 1
            }
        ));
        assert!(!dir.path().join("result.jsonl").exists());
    }

    #[test]
    fn per_subject_evaluations_merge_into_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let harness = harness(dir.path(), false);
        let backend = GenerationBackend::blocking(Grader {
            wrong: vec!["b2"],
            fail: None,
        });

        let first = harness
            .evaluate(&requests(&["a1"]), &["A"], &normalize::first_char, &backend)
            .unwrap();
        let second = harness
            .evaluate(&requests(&["b1", "b2"]), &["A", "A"], &normalize::first_char, &backend)
            .unwrap();
        assert!(!dir.path().join("result.jsonl").exists());

        let merged = Evaluation::merge([first, second]);
        assert_eq!(merged.num_requests(), 3);
        let result = harness.record("mmlu", &backend, &merged, Map::new()).unwrap();
        assert_eq!(result.num_requests, 3);
        assert_eq!(harness.config().results_log.read_all().unwrap().len(), 1);
    }
}
