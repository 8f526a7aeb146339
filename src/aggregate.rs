//! Scoring predictions against gold labels.

use crate::backend::RawOutput;
use crate::error::BenchError;

/// Answer extraction strategies for [`score`].
pub mod normalize {
    /// First non-whitespace character, for single-letter answers.
    pub fn first_char(text: &str) -> String {
        text.trim_start()
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default()
    }

    /// Last line with surrounding whitespace removed, for free-text answers.
    pub fn last_line(text: &str) -> String {
        text.rsplit('\n').next().unwrap_or_default().trim().to_string()
    }

    pub fn trimmed(text: &str) -> String {
        text.trim().to_string()
    }
}

/// Per-item correctness and its mean.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub accuracy: f64,
    pub correctness: Vec<bool>,
}

impl Score {
    pub fn from_correctness(correctness: Vec<bool>) -> Self {
        let accuracy = if correctness.is_empty() {
            0.0
        } else {
            correctness.iter().filter(|c| **c).count() as f64 / correctness.len() as f64
        };
        Self {
            accuracy,
            correctness,
        }
    }

    /// Concatenates per-subject results; the accuracy is weighted by item count.
    pub fn merge(scores: impl IntoIterator<Item = Score>) -> Self {
        let correctness = scores
            .into_iter()
            .flat_map(|score| score.correctness)
            .collect();
        Self::from_correctness(correctness)
    }

    pub fn len(&self) -> usize {
        self.correctness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correctness.is_empty()
    }

    pub fn num_correct(&self) -> usize {
        self.correctness.iter().filter(|c| **c).count()
    }
}

/// Compares `normalize(results[i].text)` with `labels[i]` by exact match.
pub fn score<L, F>(results: &[RawOutput], labels: &[L], normalize: F) -> Result<Score, BenchError>
where
    L: AsRef<str>,
    F: Fn(&str) -> String,
{
    if results.len() != labels.len() {
        return Err(BenchError::ShapeMismatch {
            results: results.len(),
            labels: labels.len(),
        });
    }
    let correctness = results
        .iter()
        .zip(labels)
        .map(|(output, label)| normalize(&output.text) == label.as_ref())
        .collect();
    Ok(Score::from_correctness(correctness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn outputs(texts: &[&str]) -> Vec<RawOutput> {
        texts.iter().map(|t| RawOutput::new(*t)).collect()
    }

    #[test]
    fn scores_predictions_against_labels() {
        let result = score(&outputs(&["A", "B", "D"]), &["A", "B", "C"], normalize::trimmed).unwrap();
        assert_eq!(result.correctness, [true, true, false]);
        assert!((result.accuracy - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn scoring_is_idempotent() {
        let results = outputs(&[" A", "C"]);
        let labels = ["A", "B"];
        let first = score(&results, &labels, normalize::first_char).unwrap();
        let second = score(&results, &labels, normalize::first_char).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let err = score(&outputs(&["A"]), &["A", "B"], normalize::trimmed).unwrap_err();
        assert!(matches!(err, BenchError::ShapeMismatch { results: 1, labels: 2 }));
    }

    #[test]
    fn caller_supplies_the_normalizer() {
        let result = score(&outputs(&["answer: yes"]), &["YES"], |t: &str| {
            t.rsplit(' ').next().unwrap_or_default().to_uppercase()
        })
        .unwrap();
        assert_eq!(result.accuracy, 1.0);
    }

    #[rstest]
    #[case("  B. because", "B")]
    #[case("\nC", "C")]
    #[case("   ", "")]
    #[case("", "")]
    fn first_char_skips_leading_whitespace(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize::first_char(raw), expected);
    }

    #[rstest]
    #[case("reasoning\nmore\n true ", "true")]
    #[case("false", "false")]
    #[case("x\n", "")]
    fn last_line_takes_final_line(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize::last_line(raw), expected);
    }

    #[test]
    fn merge_weights_by_item_count() {
        let a = Score::from_correctness(vec![true]);
        let b = Score::from_correctness(vec![false, false, true]);
        let merged = Score::merge([a, b]);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.num_correct(), 2);
        assert_eq!(merged.accuracy, 0.5);
    }

    #[test]
    fn empty_score_has_zero_accuracy() {
        let empty = Score::from_correctness(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.accuracy, 0.0);
    }
}
