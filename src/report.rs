//! Results log and raw-output dumps.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::BenchError;

/// One line of the results log.
///
/// Field names on disk: `task`, `backend`, `num_gpus`, `latency`, `accuracy`,
/// `num_requests`, `other`. Latency and accuracy are written with three
/// decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    #[serde(rename = "task")]
    pub task_name: String,
    #[serde(rename = "backend")]
    pub backend_name: String,
    pub num_gpus: u32,
    #[serde(rename = "latency", serialize_with = "round3")]
    pub latency_seconds: f64,
    #[serde(serialize_with = "round3")]
    pub accuracy: f64,
    pub num_requests: usize,
    #[serde(rename = "other", default)]
    pub extra: Map<String, Value>,
}

fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 1000.0).round() / 1000.0)
}

/// Append-only JSON-lines file of [`BenchmarkResult`]s.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `result` as a single line. Earlier lines are never touched.
    pub fn append(&self, result: &BenchmarkResult) -> Result<(), BenchError> {
        let mut line = serde_json::to_string(result)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        log::debug!("appended result to {}", self.path.display());
        Ok(())
    }

    /// Reads every record; blank lines are skipped, unknown fields ignored.
    pub fn read_all(&self) -> Result<Vec<BenchmarkResult>, BenchError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

/// Writes one framed block per output, in order, for manual inspection.
pub fn dump_outputs<'a>(
    path: &Path,
    texts: impl IntoIterator<Item = &'a str>,
) -> Result<(), BenchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    let rule = "=".repeat(40);
    for (i, text) in texts.into_iter().enumerate() {
        writeln!(out, "{rule} {i} {rule}")?;
        writeln!(out, "{text}")?;
        writeln!(out, "{}\n", "=".repeat(80))?;
    }
    out.flush()?;
    Ok(())
}
