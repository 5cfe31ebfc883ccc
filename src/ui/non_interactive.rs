//! Non-interactive UI for silent and headless runs.

use std::collections::HashMap;

use crate::error::{ActorError, Result};

use super::{
    parse_bool, DownloadProgress, HiddenProgress, OutputMode, Prompt, PromptResult, PromptType,
    UserInterface,
};

const OVERRIDE_PREFIX: &str = "ACTOR_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `ACTOR_PROMPT_<KEY>` environment variables,
/// then from the prompt's default. Progress bars are never drawn.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(OVERRIDE_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }
}

/// Environment variable name answering the prompt `key`.
pub fn override_key(key: &str) -> String {
    let normalized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", OVERRIDE_PREFIX, normalized)
}

fn answer(prompt: &Prompt, value: &str) -> Result<PromptResult> {
    match prompt.prompt_type {
        PromptType::Confirm => parse_bool(value).map(PromptResult::Bool).ok_or_else(|| {
            ActorError::Other(anyhow::anyhow!(
                "'{}' is not a yes/no answer for '{}'",
                value,
                prompt.key
            ))
        }),
        PromptType::Input => Ok(PromptResult::String(value.to_string())),
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n=== {} ===\n", title);
        }
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        if let Some(value) = self.env_overrides.get(&override_key(&prompt.key)) {
            return answer(prompt, value);
        }

        if let Some(default) = &prompt.default {
            return answer(prompt, default);
        }

        Err(ActorError::Other(anyhow::anyhow!(
            "Cannot prompt for '{}' in non-interactive mode (no default value)",
            prompt.key
        )))
    }

    fn start_download(&mut self, _label: &str) -> Box<dyn DownloadProgress> {
        Box::new(HiddenProgress)
    }

    fn acknowledge(&mut self, msg: &str) {
        self.error(msg);
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_default_for_confirm() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        let result = ui
            .prompt(&Prompt::confirm("overwrite_configurations", "Overwrite?", false))
            .unwrap();
        assert_eq!(result, PromptResult::Bool(false));
    }

    #[test]
    fn env_override_wins_over_default() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "ACTOR_PROMPT_OVERWRITE_CONFIGURATIONS".to_string(),
            "yes".to_string(),
        );
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);
        let result = ui
            .prompt(&Prompt::confirm("overwrite_configurations", "Overwrite?", false))
            .unwrap();
        assert_eq!(result, PromptResult::Bool(true));
    }

    #[test]
    fn override_key_normalizes_component_names() {
        assert_eq!(
            override_key("component:OverlayPlugin"),
            "ACTOR_PROMPT_COMPONENT_OVERLAYPLUGIN"
        );
    }

    #[test]
    fn input_without_default_is_an_error() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, HashMap::new());
        let err = ui
            .prompt(&Prompt::input("install_path", "Install directory", None))
            .unwrap_err();
        assert!(err.to_string().contains("install_path"));
    }

    #[test]
    fn unparseable_confirm_override_is_an_error() {
        let mut overrides = HashMap::new();
        overrides.insert("ACTOR_PROMPT_PREREQUISITES".to_string(), "later".to_string());
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Silent, overrides);
        assert!(ui
            .prompt(&Prompt::confirm("prerequisites", "Install?", true))
            .is_err());
    }

    #[test]
    fn never_interactive() {
        let ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        assert!(!ui.is_interactive());
    }
}
