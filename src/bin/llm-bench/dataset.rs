//! Loaders for the benchmark datasets on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use llm_bench::{BenchError, Example};

/// Subjects that have a `<subject><suffix>` file in `dir`, sorted by name.
pub fn list_subjects(dir: &Path, suffix: &str) -> Result<Vec<String>, BenchError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| BenchError::Dataset(format!("cannot list {}: {e}", dir.display())))?;
    let mut subjects = Vec::new();
    for entry in entries {
        let name = entry?.file_name();
        if let Some(subject) = name.to_str().and_then(|n| n.strip_suffix(suffix)) {
            subjects.push(subject.to_string());
        }
    }
    subjects.sort();
    Ok(subjects)
}

/// A C-Eval split: `<dir>/dev/<subject>_dev.csv` and `<dir>/val/<subject>_val.csv`.
pub struct CevalLayout {
    pub root: PathBuf,
}

impl CevalLayout {
    pub fn subjects(&self) -> Result<Vec<String>, BenchError> {
        list_subjects(&self.root.join("val"), "_val.csv")
    }

    pub fn dev(&self, subject: &str) -> PathBuf {
        self.root.join("dev").join(format!("{subject}_dev.csv"))
    }

    pub fn val(&self, subject: &str) -> PathBuf {
        self.root.join("val").join(format!("{subject}_val.csv"))
    }
}

/// An MMLU split: `<dir>/dev/<subject>_dev.csv` and `<dir>/test/<subject>_test.csv`.
pub struct MmluLayout {
    pub root: PathBuf,
}

impl MmluLayout {
    pub fn subjects(&self) -> Result<Vec<String>, BenchError> {
        list_subjects(&self.root.join("test"), "_test.csv")
    }

    pub fn dev(&self, subject: &str) -> PathBuf {
        self.root.join("dev").join(format!("{subject}_dev.csv"))
    }

    pub fn test(&self, subject: &str) -> PathBuf {
        self.root.join("test").join(format!("{subject}_test.csv"))
    }
}

const CHOICE_COLUMNS: [&str; 4] = ["A", "B", "C", "D"];

/// Reads a C-Eval CSV with a header row (`id,question,A,B,C,D,answer[,explanation]`).
pub fn read_ceval_csv(path: &Path, limit: Option<usize>) -> Result<Vec<Example>, BenchError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| {
                BenchError::Dataset(format!("{}: missing column '{name}'", path.display()))
            })
    };
    let question = column("question")?;
    let answer = column("answer")?;
    let choices = CHOICE_COLUMNS
        .iter()
        .map(|&name| column(name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut examples = Vec::new();
    for record in reader.records().take(limit.unwrap_or(usize::MAX)) {
        let record = record.map_err(|e| csv_error(path, e))?;
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        examples.push(Example {
            question: field(question),
            choices: choices.iter().map(|&i| field(i)).collect(),
            answer: field(answer).trim().to_string(),
        });
    }
    Ok(examples)
}

/// Reads a headerless MMLU CSV: question, the choices, then the answer.
pub fn read_mmlu_csv(path: &Path, limit: Option<usize>) -> Result<Vec<Example>, BenchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;
    let mut examples = Vec::new();
    for (row, record) in reader
        .records()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
    {
        let record = record.map_err(|e| csv_error(path, e))?;
        if record.len() < 3 {
            return Err(BenchError::Dataset(format!(
                "{}: row {row} has {} columns, expected question, choices and answer",
                path.display(),
                record.len()
            )));
        }
        let fields: Vec<&str> = record.iter().collect();
        let last = fields.len() - 1;
        examples.push(Example::new(
            fields[0],
            fields[1..last].iter().copied(),
            fields[last].trim(),
        ));
    }
    Ok(examples)
}

fn csv_error(path: &Path, err: csv::Error) -> BenchError {
    BenchError::Dataset(format!("{}: {err}", path.display()))
}

/// One CLUEWSC record.
#[derive(Debug, Clone, Deserialize)]
pub struct WscRecord {
    pub text: String,
    pub target: WscTarget,
    pub label: WscLabel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WscTarget {
    pub span1_index: i64,
    pub span1_text: String,
    pub span2_index: i64,
    pub span2_text: String,
}

/// Gold label; some dumps store it as a JSON boolean.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WscLabel {
    Text(String),
    Flag(bool),
}

impl WscLabel {
    pub fn as_label(&self) -> String {
        match self {
            WscLabel::Text(text) => text.clone(),
            WscLabel::Flag(flag) => flag.to_string(),
        }
    }
}

/// Reads up to `limit` records from a JSON-lines file.
pub fn read_wsc_jsonl(path: &Path, limit: usize) -> Result<Vec<WscRecord>, BenchError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| BenchError::Dataset(format!("cannot read {}: {e}", path.display())))?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(limit)
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| {
                BenchError::Dataset(format!("{} record {i}: {e}", path.display()))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceval_columns_are_read_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("law_val.csv");
        fs::write(
            &path,
            "id,question,A,B,C,D,answer\n0,q0,a,b,c,d,C\n1,\"q1, quoted\",e,f,g,h, A\n",
        )
        .unwrap();
        let examples = read_ceval_csv(&path, None).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0], Example::new("q0", ["a", "b", "c", "d"], "C"));
        assert_eq!(examples[1].question, "q1, quoted");
        assert_eq!(examples[1].answer, "A");
    }

    #[test]
    fn ceval_dev_limit_and_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("law_dev.csv");
        fs::write(
            &path,
            "id,question,A,B,C,D,answer,explanation\n0,q0,a,b,c,d,B,why\n1,q1,a,b,c,d,D,why\n",
        )
        .unwrap();
        let examples = read_ceval_csv(&path, Some(1)).unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].answer, "B");
    }

    #[test]
    fn ceval_missing_column_is_a_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,question,A,B,answer\n0,q,a,b,A\n").unwrap();
        assert!(matches!(
            read_ceval_csv(&path, None),
            Err(BenchError::Dataset(_))
        ));
    }

    #[test]
    fn mmlu_rows_are_positional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anatomy_test.csv");
        fs::write(&path, "q0,a,b,c,d,A\nq1,e,f,g,h,D\n").unwrap();
        let examples = read_mmlu_csv(&path, None).unwrap();
        assert_eq!(examples[1], Example::new("q1", ["e", "f", "g", "h"], "D"));
    }

    #[test]
    fn subjects_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let val = dir.path().join("val");
        fs::create_dir_all(&val).unwrap();
        for name in ["law_val.csv", "art_val.csv", "notes.txt"] {
            fs::write(val.join(name), "").unwrap();
        }
        let layout = CevalLayout {
            root: dir.path().to_path_buf(),
        };
        assert_eq!(layout.subjects().unwrap(), ["art", "law"]);
    }

    #[test]
    fn wsc_records_accept_string_or_bool_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        let record = |label: &str| {
            format!(
                "{{\"text\":\"t\",\"target\":{{\"span1_index\":0,\"span1_text\":\"a\",\
                 \"span2_index\":3,\"span2_text\":\"b\"}},\"label\":{label}}}\n"
            )
        };
        fs::write(&path, record("\"true\"") + &record("false") + &record("true")).unwrap();
        let records = read_wsc_jsonl(&path, 2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label.as_label(), "true");
        assert_eq!(records[1].label.as_label(), "false");
    }
}
