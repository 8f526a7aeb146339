use super::example::Example;

const DEFAULT_ANSWER_CUE: &str = "Answer:";

/// Wording of a few-shot prompt: header line, choice labels and answer cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    header: String,
    choice_labels: Vec<String>,
    answer_cue: String,
}

impl PromptTemplate {
    /// Creates a template with the given header and lettered choices.
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            choice_labels: Vec::new(),
            answer_cue: DEFAULT_ANSWER_CUE.to_string(),
        }
    }

    /// English multiple-choice header for `subject` (underscore separated).
    pub fn multiple_choice(subject: &str) -> Self {
        Self::new(format!(
            "The following are multiple choice questions (with answers) about{}.\n\n",
            format_subject(subject)
        ))
    }

    /// Chinese multiple-choice header used by C-Eval.
    pub fn ceval(subject: &str) -> Self {
        Self::new(format!(
            "以下是关于{}的多项选择题（附答案）。\n\n",
            format_subject(subject)
        ))
    }

    /// Overrides the labels printed before each choice.
    ///
    /// Choices beyond the given labels fall back to letters.
    pub fn with_choice_labels(
        mut self,
        labels: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.choice_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_answer_cue(mut self, cue: impl Into<String>) -> Self {
        self.answer_cue = cue.into();
        self
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub(super) fn render_example(&self, example: &Example, include_answer: bool, out: &mut String) {
        out.push_str(&example.question);
        for (idx, choice) in example.choices.iter().enumerate() {
            out.push('\n');
            out.push_str(&self.choice_label(idx));
            out.push_str(". ");
            out.push_str(choice);
        }
        out.push('\n');
        out.push_str(&self.answer_cue);
        if include_answer {
            out.push(' ');
            out.push_str(&example.answer);
            out.push_str("\n\n");
        }
    }

    fn choice_label(&self, idx: usize) -> String {
        match self.choice_labels.get(idx) {
            Some(label) => label.clone(),
            None => letter(idx),
        }
    }
}

fn letter(idx: usize) -> String {
    if idx < 26 {
        char::from(b'A' + idx as u8).to_string()
    } else {
        (idx + 1).to_string()
    }
}

/// Renders `high_school_physics` as ` high school physics`.
pub fn format_subject(subject: &str) -> String {
    subject.split('_').map(|word| format!(" {word}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Example {
        Example::new("1 + 1 = ?", ["1", "2", "3", "4"], "B")
    }

    #[test]
    fn subject_words_are_space_prefixed() {
        assert_eq!(format_subject("college_computer_science"), " college computer science");
        assert_eq!(format_subject("law"), " law");
    }

    #[test]
    fn renders_example_with_answer() {
        let mut out = String::new();
        PromptTemplate::multiple_choice("math").render_example(&sample(), true, &mut out);
        assert_eq!(out, "1 + 1 = ?\nA. 1\nB. 2\nC. 3\nD. 4\nAnswer: B\n\n");
    }

    #[test]
    fn renders_test_item_without_answer() {
        let mut out = String::new();
        PromptTemplate::multiple_choice("math").render_example(&sample(), false, &mut out);
        assert_eq!(out, "1 + 1 = ?\nA. 1\nB. 2\nC. 3\nD. 4\nAnswer:");
    }

    #[test]
    fn custom_labels_fall_back_to_letters() {
        let template = PromptTemplate::new("").with_choice_labels(["true"]);
        let example = Example::new("q", ["x", "y"], "true");
        let mut out = String::new();
        template.render_example(&example, false, &mut out);
        assert_eq!(out, "q\ntrue. x\nB. y\nAnswer:");
    }

    #[test]
    fn headers_include_subject() {
        assert_eq!(
            PromptTemplate::multiple_choice("world_history").header(),
            "The following are multiple choice questions (with answers) about world history.\n\n"
        );
        assert!(PromptTemplate::ceval("law").header().contains(" law"));
    }
}
