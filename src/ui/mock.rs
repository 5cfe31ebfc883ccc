//! Recording [`UserInterface`] for tests.
//!
//! Every status line, header, download and prompt is kept so a test can
//! assert on what a pipeline run told the user. Prompt answers come from
//! scripted responses.
//!
//! ```
//! use actor::ui::{MockUI, Prompt, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("prerequisites", "no");
//!
//! let answer = ui.prompt(&Prompt::confirm("prerequisites", "Install?", true)).unwrap();
//! assert_eq!(answer.as_bool(), Some(false));
//! assert_eq!(ui.prompts_shown(), &["prerequisites".to_string()]);
//! ```

use std::collections::{HashMap, VecDeque};

use crate::error::Result;

use super::{
    parse_bool, DownloadProgress, OutputMode, Prompt, PromptResult, PromptType, UserInterface,
};

/// A UI that answers prompts from a script and remembers everything shown.
///
/// Answer lookup order for a key: its queue, its fixed response, the
/// catch-all response, then the prompt's own default.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    downloads: Vec<String>,
    acknowledgements: Vec<String>,
    prompt_responses: HashMap<String, String>,
    prompt_queues: HashMap<String, VecDeque<String>>,
    prompts_shown: Vec<String>,
    /// Fallback response for any prompt key not configured otherwise.
    default_prompt_response: Option<String>,
}

impl MockUI {
    /// Non-interactive, normal output.
    pub fn new() -> Self {
        Self {
            mode: OutputMode::Normal,
            ..Default::default()
        }
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Reports itself as interactive, like a terminal session.
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::new()
        }
    }

    /// Answer every `key` prompt with `response`.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Answer successive `key` prompts in order. Once drained, lookup
    /// continues with the fixed response.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        let queue = responses.into_iter().map(|s| s.to_string()).collect();
        self.prompt_queues.insert(key.to_string(), queue);
    }

    /// Catch-all answer for keys with nothing scripted.
    pub fn set_default_prompt_response(&mut self, response: &str) {
        self.default_prompt_response = Some(response.to_string());
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Labels of every download display that was started.
    pub fn downloads(&self) -> &[String] {
        &self.downloads
    }

    pub fn acknowledgements(&self) -> &[String] {
        &self.acknowledgements
    }

    /// Keys of shown prompts, in order.
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    /// How many times the prompt `key` was shown.
    pub fn prompt_count(&self, key: &str) -> usize {
        self.prompts_shown.iter().filter(|k| *k == key).count()
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    fn next_response(&mut self, key: &str) -> Option<String> {
        if let Some(response) = self
            .prompt_queues
            .get_mut(key)
            .and_then(|queue| queue.pop_front())
        {
            return Some(response);
        }
        self.prompt_responses
            .get(key)
            .cloned()
            .or_else(|| self.default_prompt_response.clone())
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        let response = self
            .next_response(&prompt.key)
            .or_else(|| prompt.default.clone())
            .unwrap_or_default();

        Ok(match prompt.prompt_type {
            PromptType::Confirm => PromptResult::Bool(parse_bool(&response).unwrap_or(false)),
            PromptType::Input => PromptResult::String(response),
        })
    }

    fn start_download(&mut self, label: &str) -> Box<dyn DownloadProgress> {
        self.downloads.push(label.to_string());
        Box::new(MockProgress::default())
    }

    fn acknowledge(&mut self, msg: &str) {
        self.acknowledgements.push(msg.to_string());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Download display that records what it was told.
#[derive(Debug, Default)]
pub struct MockProgress {
    pub percents: Vec<u8>,
    pub finished: Option<bool>,
}

impl DownloadProgress for MockProgress {
    fn set_percent(&mut self, percent: u8) {
        self.percents.push(percent);
    }

    fn finish(&mut self, success: bool) {
        self.finished = Some(success);
    }
}
