use crate::backend::{PromptRequest, SamplingParams};
use crate::tokenizer::TokenCounter;

use super::example::{Example, MaxShots};
use super::template::PromptTemplate;

/// A rendered prompt, the number of training examples it includes and its
/// token count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FewShotPrompt {
    pub text: String,
    pub shots: usize,
    pub tokens: usize,
}

/// Assembles header + training examples + test item, dropping trailing
/// examples until the prompt fits the token budget.
pub struct FewShotPromptBuilder<'a> {
    counter: &'a dyn TokenCounter,
    template: PromptTemplate,
}

impl<'a> FewShotPromptBuilder<'a> {
    pub fn new(counter: &'a dyn TokenCounter, template: PromptTemplate) -> Self {
        Self { counter, template }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Builds the prompt text for `test`.
    pub fn build(
        &self,
        train: &[Example],
        test: &Example,
        max_shots: MaxShots,
        token_budget: usize,
    ) -> String {
        self.build_with_shots(train, test, max_shots, token_budget).text
    }

    /// Builds the prompt for `test` and reports how many shots survived.
    ///
    /// If even the zero-shot prompt exceeds the budget it is returned as is.
    pub fn build_with_shots(
        &self,
        train: &[Example],
        test: &Example,
        max_shots: MaxShots,
        token_budget: usize,
    ) -> FewShotPrompt {
        let prompt = self.fit(train, test, max_shots, token_budget);
        if prompt.tokens > token_budget {
            log::warn!(
                "zero-shot prompt uses {} tokens, over the budget of {token_budget}",
                prompt.tokens
            );
        }
        prompt
    }

    /// Builds one request per test item, indexed by position in `tests`.
    pub fn build_requests(
        &self,
        train: &[Example],
        tests: &[Example],
        max_shots: MaxShots,
        token_budget: usize,
        params: &SamplingParams,
    ) -> Vec<PromptRequest> {
        let mut over_budget = 0usize;
        let requests = tests
            .iter()
            .enumerate()
            .map(|(index, test)| {
                let prompt = self.fit(train, test, max_shots, token_budget);
                if prompt.tokens > token_budget {
                    over_budget += 1;
                }
                PromptRequest {
                    index,
                    text: prompt.text,
                    sampling_params: params.clone(),
                }
            })
            .collect();
        if over_budget > 0 {
            log::warn!(
                "{over_budget} of {} zero-shot prompts exceed {token_budget} tokens",
                tests.len()
            );
        }
        requests
    }

    /// Drops trailing shots until the prompt fits; each rendering is counted once.
    fn fit(
        &self,
        train: &[Example],
        test: &Example,
        max_shots: MaxShots,
        token_budget: usize,
    ) -> FewShotPrompt {
        let mut shots = max_shots.resolve(train.len());
        let mut text = self.render(&train[..shots], test);
        let mut tokens = self.counter.count(&text);
        while shots > 0 && tokens > token_budget {
            shots -= 1;
            text = self.render(&train[..shots], test);
            tokens = self.counter.count(&text);
        }
        FewShotPrompt { text, shots, tokens }
    }

    fn render(&self, shots: &[Example], test: &Example) -> String {
        let mut out = self.template.header().to_string();
        for example in shots {
            self.template.render_example(example, true, &mut out);
        }
        self.template.render_example(test, false, &mut out);
        out
    }
}
