//! Tabular view of the results log.

use llm_bench::BenchmarkResult;

use crate::args::ReportArgs;

/// Records matching `args`, oldest first.
pub fn select<'a>(records: &'a [BenchmarkResult], args: &ReportArgs) -> Vec<&'a BenchmarkResult> {
    let matching: Vec<_> = records
        .iter()
        .filter(|r| args.task.as_deref().map_or(true, |task| r.task_name == task))
        .collect();
    let skip = args
        .last
        .map_or(0, |last| matching.len().saturating_sub(last));
    matching.into_iter().skip(skip).collect()
}

pub fn render_table(records: &[&BenchmarkResult]) -> String {
    let header = ["task", "backend", "gpus", "latency", "accuracy", "requests", "parallel"];
    let rows: Vec<[String; 7]> = records
        .iter()
        .map(|r| {
            [
                r.task_name.clone(),
                r.backend_name.clone(),
                r.num_gpus.to_string(),
                format!("{:.3}", r.latency_seconds),
                format!("{:.3}", r.accuracy),
                r.num_requests.to_string(),
                r.extra
                    .get("parallel")
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, header.iter().copied(), &widths);
    for row in &rows {
        push_row(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
