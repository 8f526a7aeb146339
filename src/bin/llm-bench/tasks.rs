//! Benchmark tasks: dataset → requests → harness.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use llm_bench::aggregate::normalize;
use llm_bench::backend::PromptRequest;
use llm_bench::{
    BenchError, BenchmarkResult, Evaluation, Example, FewShotPromptBuilder, GenerationBackend,
    Harness, MaxShots, PromptTemplate, SamplingParams, TaskRun, TokenCounter,
};

use crate::args::{MultipleChoiceArgs, WscArgs};
use crate::dataset::{self, CevalLayout, MmluLayout, WscRecord};

const WSC_MAX_TOKENS: u32 = 256;
const WSC_STOP: [&str; 3] = ["Question", "Assistant:", "<|separator|>"];

/// Prompt-size settings shared by the few-shot tasks.
pub struct PromptSettings<'a> {
    pub counter: &'a dyn TokenCounter,
    pub max_shots: MaxShots,
    pub token_budget: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipleChoiceSuite {
    Ceval,
    Mmlu,
}

impl MultipleChoiceSuite {
    pub fn task_name(self) -> &'static str {
        match self {
            MultipleChoiceSuite::Ceval => "ceval",
            MultipleChoiceSuite::Mmlu => "mmlu",
        }
    }

    fn default_data_dir(self) -> &'static str {
        match self {
            MultipleChoiceSuite::Ceval => "ceval_data",
            MultipleChoiceSuite::Mmlu => "data",
        }
    }

    fn template(self, subject: &str) -> PromptTemplate {
        match self {
            MultipleChoiceSuite::Ceval => PromptTemplate::ceval(subject),
            MultipleChoiceSuite::Mmlu => PromptTemplate::multiple_choice(subject),
        }
    }

    fn subjects(self, root: &Path) -> Result<Vec<String>, BenchError> {
        match self {
            MultipleChoiceSuite::Ceval => CevalLayout { root: root.into() }.subjects(),
            MultipleChoiceSuite::Mmlu => MmluLayout { root: root.into() }.subjects(),
        }
    }

    /// Training examples (first `ntrain`) and test items for `subject`.
    fn load(
        self,
        root: &Path,
        subject: &str,
        ntrain: usize,
    ) -> Result<(Vec<Example>, Vec<Example>), BenchError> {
        match self {
            MultipleChoiceSuite::Ceval => {
                let layout = CevalLayout { root: root.into() };
                Ok((
                    dataset::read_ceval_csv(&layout.dev(subject), Some(ntrain))?,
                    dataset::read_ceval_csv(&layout.val(subject), None)?,
                ))
            }
            MultipleChoiceSuite::Mmlu => {
                let layout = MmluLayout { root: root.into() };
                Ok((
                    dataset::read_mmlu_csv(&layout.dev(subject), Some(ntrain))?,
                    dataset::read_mmlu_csv(&layout.test(subject), None)?,
                ))
            }
        }
    }
}

/// Evaluates every subject separately and records one merged result.
pub fn run_multiple_choice(
    harness: &Harness,
    backend: &GenerationBackend,
    suite: MultipleChoiceSuite,
    prompt: &PromptSettings<'_>,
    args: &MultipleChoiceArgs,
) -> Result<BenchmarkResult, BenchError> {
    let root = args
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(suite.default_data_dir()));
    let subjects = suite.subjects(&root)?;
    if subjects.is_empty() {
        return Err(BenchError::Dataset(format!(
            "no {} subjects found under {}",
            suite.task_name(),
            root.display()
        )));
    }

    let params = SamplingParams::greedy(1);
    let mut parts = Vec::new();
    for subject in subjects.iter().take(args.nsub) {
        let (train, tests) = suite.load(&root, subject, args.ntrain)?;
        let builder = FewShotPromptBuilder::new(prompt.counter, suite.template(subject));
        let requests =
            builder.build_requests(&train, &tests, prompt.max_shots, prompt.token_budget, &params);
        let labels: Vec<&str> = tests.iter().map(|t| t.answer.as_str()).collect();
        log::info!("{subject}: {} questions", requests.len());
        parts.push(harness.evaluate(&requests, &labels, &normalize::first_char, backend)?);
    }

    let merged = Evaluation::merge(parts);
    log::info!(
        "{} total latency {:.3}s, average accuracy {:.3}",
        suite.task_name(),
        merged.dispatched.latency.as_secs_f64(),
        merged.score.accuracy
    );
    let mut other = Map::new();
    other.insert("nsub".into(), Value::from(args.nsub));
    other.insert("ntrain".into(), Value::from(args.ntrain));
    harness.record(suite.task_name(), backend, &merged, other)
}

/// Pronoun-resolution question for one record; the model answers true or false.
pub fn wsc_prompt(record: &WscRecord) -> String {
    let target = &record.target;
    format!(
        "如下是一个代词消歧的任务。即判断句子中的代词指代的是哪个名词。\n\
         句子：{}\n\
         问题：第\"{}\"个字符处开始的代词\"{}\"指代的是第\"{}\"个字符处开始的名词\"{}\"吗？\n\
         请直接给出答案true或者false:",
        record.text, target.span2_index, target.span2_text, target.span1_index, target.span1_text
    )
}

pub fn run_cluewsc(
    harness: &Harness,
    backend: &GenerationBackend,
    args: &WscArgs,
) -> Result<BenchmarkResult, BenchError> {
    let records = dataset::read_wsc_jsonl(&args.data_path, args.num_questions)?;
    let params = SamplingParams::greedy(WSC_MAX_TOKENS).with_stop(WSC_STOP);
    let requests = records
        .iter()
        .enumerate()
        .map(|(index, record)| PromptRequest {
            index,
            text: wsc_prompt(record),
            sampling_params: params.clone(),
        })
        .collect();
    let labels = records.iter().map(|r| r.label.as_label()).collect();

    let mut other = Map::new();
    other.insert("num_questions".into(), Value::from(args.num_questions));
    harness.run(
        TaskRun {
            task: "cluewsc".into(),
            requests,
            labels,
            normalizer: &normalize::last_line,
            params: other,
        },
        backend,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{WscLabel, WscTarget};
    use llm_bench::backend::{BlockingBackend, RawOutput};
    use llm_bench::{BackendError, Concurrency, ExecutionMode, HarnessConfig, ResultsLog};
    use std::fs;

    /// Always answers with the last choice letter seen in the prompt.
    struct LastChoice;

    impl BlockingBackend for LastChoice {
        fn name(&self) -> &str {
            "last-choice"
        }

        fn generate(&self, prompt: &str, _: &SamplingParams) -> Result<RawOutput, BackendError> {
            let letter = prompt
                .lines()
                .rev()
                .find_map(|line| line.split_once(". ").map(|(label, _)| label.to_string()))
                .unwrap_or_default();
            Ok(RawOutput::new(format!(" {letter}")))
        }
    }

    fn harness(dir: &Path) -> Harness {
        Harness::new(HarnessConfig {
            concurrency: Concurrency::try_from(2).unwrap(),
            mode: ExecutionMode::WorkerPool,
            num_gpus: 1,
            results_log: ResultsLog::new(dir.join("result.jsonl")),
            dump_path: None,
        })
    }

    #[test]
    fn wsc_prompt_names_both_spans() {
        let record = WscRecord {
            text: "小明把书给了他".into(),
            target: WscTarget {
                span1_index: 0,
                span1_text: "小明".into(),
                span2_index: 6,
                span2_text: "他".into(),
            },
            label: WscLabel::Text("false".into()),
        };
        let prompt = wsc_prompt(&record);
        assert!(prompt.contains("句子：小明把书给了他\n"));
        assert!(prompt.contains("第\"6\"个字符处开始的代词\"他\""));
        assert!(prompt.ends_with("请直接给出答案true或者false:"));
    }

    #[test]
    fn mmlu_run_merges_subjects_into_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        for split in ["dev", "test"] {
            fs::create_dir_all(data.join(split)).unwrap();
        }
        fs::write(data.join("dev/algebra_dev.csv"), "d0,1,2,3,4,A\n").unwrap();
        fs::write(data.join("test/algebra_test.csv"), "t0,1,2,3,4,D\nt1,1,2,3,4,B\n").unwrap();
        fs::write(data.join("dev/anatomy_dev.csv"), "d0,x,y,z,w,C\n").unwrap();
        fs::write(data.join("test/anatomy_test.csv"), "t0,x,y,z,w,D\n").unwrap();

        let harness = harness(dir.path());
        let backend = GenerationBackend::blocking(LastChoice);
        let counter = |text: &str| text.split_whitespace().count();
        let prompt = PromptSettings {
            counter: &counter,
            max_shots: MaxShots::All,
            token_budget: 1536,
        };
        let args = MultipleChoiceArgs {
            data_dir: Some(data),
            ntrain: 5,
            nsub: 60,
        };

        let result =
            run_multiple_choice(&harness, &backend, MultipleChoiceSuite::Mmlu, &prompt, &args)
                .unwrap();
        assert_eq!(result.task_name, "mmlu");
        assert_eq!(result.num_requests, 3);
        assert!((result.accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.extra["nsub"], 60);
        assert_eq!(harness.config().results_log.read_all().unwrap().len(), 1);
    }

    #[test]
    fn missing_subjects_is_a_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("val")).unwrap();
        let harness = harness(dir.path());
        let counter = |text: &str| text.len();
        let prompt = PromptSettings {
            counter: &counter,
            max_shots: MaxShots::All,
            token_budget: 10,
        };
        let args = MultipleChoiceArgs {
            data_dir: Some(dir.path().to_path_buf()),
            ntrain: 5,
            nsub: 60,
        };
        let err = run_multiple_choice(
            &harness,
            &GenerationBackend::blocking(LastChoice),
            MultipleChoiceSuite::Ceval,
            &prompt,
            &args,
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::Dataset(_)));
    }
}
