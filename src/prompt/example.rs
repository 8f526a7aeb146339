use serde::{Deserialize, Serialize};

use crate::error::BenchError;

/// One multiple-choice item: question, ordered answer choices and gold label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    pub choices: Vec<String>,
    pub answer: String,
}

impl Example {
    pub fn new(
        question: impl Into<String>,
        choices: impl IntoIterator<Item = impl Into<String>>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            choices: choices.into_iter().map(Into::into).collect(),
            answer: answer.into(),
        }
    }
}

/// Upper bound on the number of training examples placed in a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxShots {
    /// Every available training example.
    All,
    /// At most this many training examples.
    Limit(usize),
}

impl MaxShots {
    /// Parses the command-line convention where `-1` selects every example.
    pub fn from_arg(raw: i64) -> Result<Self, BenchError> {
        match raw {
            -1 => Ok(MaxShots::All),
            n if n >= 0 => Ok(MaxShots::Limit(n as usize)),
            n => Err(BenchError::config(format!(
                "max shots must be -1 (all) or non-negative, got {n}"
            ))),
        }
    }

    /// Number of shots to start from given `available` training examples.
    pub fn resolve(self, available: usize) -> usize {
        match self {
            MaxShots::All => available,
            MaxShots::Limit(n) => n.min(available),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-1, MaxShots::All)]
    #[case(0, MaxShots::Limit(0))]
    #[case(5, MaxShots::Limit(5))]
    fn parses_shot_argument(#[case] raw: i64, #[case] expected: MaxShots) {
        assert_eq!(MaxShots::from_arg(raw).unwrap(), expected);
    }

    #[test]
    fn rejects_other_negative_shot_counts() {
        assert!(matches!(MaxShots::from_arg(-2), Err(BenchError::Config(_))));
    }

    #[test]
    fn all_is_not_zero_shot() {
        assert_eq!(MaxShots::All.resolve(4), 4);
        assert_eq!(MaxShots::Limit(0).resolve(4), 0);
        assert_eq!(MaxShots::Limit(9).resolve(4), 4);
    }
}
