//! Everything the installer shows or asks goes through [`UserInterface`].
//!
//! A run gets a [`TerminalUI`] when someone is there to answer prompts and
//! a [`NonInteractiveUI`] for `/y`, `/n` and headless runs. Tests use
//! [`MockUI`].
//!
//! ```
//! use actor::ui::{create_ui, OutputMode};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet, false);
//! ui.show_header("Actor");
//! ui.success("Installation complete");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod progress;
pub mod prompts;
pub mod terminal;
pub mod theme;

pub use mock::{MockProgress, MockUI};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use progress::{DownloadBar, HiddenProgress};
pub use prompts::prompt_user;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, ActorTheme};

use crate::error::Result;

/// Output and questions for one installer run.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    /// Plain informational line; hidden in quiet and silent modes.
    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    /// Shown in every output mode.
    fn error(&mut self, msg: &str);

    /// Section title such as "Components".
    fn show_header(&mut self, title: &str);

    /// Ask a question. Non-interactive implementations answer from
    /// overrides or the prompt default.
    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult>;

    /// Start a progress display for one download.
    fn start_download(&mut self, label: &str) -> Box<dyn DownloadProgress>;

    /// Tell the user about a fatal condition and wait until they have seen it.
    fn acknowledge(&mut self, msg: &str);

    /// Whether a person can answer prompts.
    fn is_interactive(&self) -> bool;
}

/// Handle for a download progress display.
pub trait DownloadProgress {
    /// Update the displayed percentage.
    fn set_percent(&mut self, percent: u8);

    /// Close the display.
    fn finish(&mut self, success: bool);
}

/// A question for the user.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Stable identifier; `ACTOR_PROMPT_<KEY>` overrides the answer in
    /// non-interactive runs.
    pub key: String,
    pub question: String,
    pub prompt_type: PromptType,
    /// Answer used on a bare Enter or when nobody can be asked.
    pub default: Option<String>,
}

impl Prompt {
    /// A yes/no question.
    pub fn confirm(key: &str, question: impl Into<String>, default: bool) -> Self {
        Self {
            key: key.to_string(),
            question: question.into(),
            prompt_type: PromptType::Confirm,
            default: Some(default.to_string()),
        }
    }

    /// A free-form text question.
    pub fn input(key: &str, question: impl Into<String>, default: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            question: question.into(),
            prompt_type: PromptType::Input,
            default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptType {
    Confirm,
    Input,
}

/// An answer: `Bool` for confirmations, `String` for text input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    Bool(bool),
    String(String),
}

impl PromptResult {
    /// Get as string.
    pub fn as_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    /// Get as bool; strings are read as yes/no answers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => parse_bool(s),
        }
    }
}

/// Read a yes/no answer.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_result_as_string() {
        assert_eq!(PromptResult::Bool(true).as_string(), "true");
        assert_eq!(
            PromptResult::String("C:\\ACT".to_string()).as_string(),
            "C:\\ACT"
        );
    }

    #[test]
    fn prompt_result_as_bool() {
        assert_eq!(PromptResult::Bool(false).as_bool(), Some(false));
        assert_eq!(PromptResult::String("Yes".to_string()).as_bool(), Some(true));
        assert_eq!(PromptResult::String("maybe".to_string()).as_bool(), None);
    }

    #[test]
    fn confirm_prompt_carries_default() {
        let prompt = Prompt::confirm("prerequisites", "Install prerequisites?", true);
        assert_eq!(prompt.prompt_type, PromptType::Confirm);
        assert_eq!(prompt.default.as_deref(), Some("true"));
    }

    #[test]
    fn input_prompt_without_default() {
        let prompt = Prompt::input("install_path", "Install directory", None);
        assert_eq!(prompt.prompt_type, PromptType::Input);
        assert!(prompt.default.is_none());
    }

    #[test]
    fn parse_bool_accepts_common_answers() {
        for yes in ["true", "YES", "y", "1"] {
            assert_eq!(parse_bool(yes), Some(true));
        }
        for no in ["false", "No", "n", "0"] {
            assert_eq!(parse_bool(no), Some(false));
        }
        assert_eq!(parse_bool(""), None);
    }
}
