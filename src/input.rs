//! Reedline-based composer: line editing with history, backslash
//! continuation for multi-line messages, and slash-command highlighting.

use anyhow::{Context, Result};
use nu_ansi_term::{Color, Style};
use reedline::{
    FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    Reedline, Signal, ValidationResult, Validator,
};
use std::borrow::Cow;
use std::path::PathBuf;

use crate::persona::Persona;

const HISTORY_CAPACITY: usize = 500;

/// What the composer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Submitted(String),
    Interrupted,
    Exit,
}

struct ChatPrompt {
    persona: String,
}

impl Prompt for ChatPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Owned(format!("{} ", self.persona))
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("❯ ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("│ ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}reverse-search: {}) ", prefix, history_search.term))
    }
}

/// One-off prompt for auxiliary questions such as API key entry.
struct LabelPrompt {
    label: String,
}

impl Prompt for LabelPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Owned(format!("{} ", self.label))
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("❯ ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("│ ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        Cow::Owned(format!("(reverse-search: {}) ", history_search.term))
    }
}

/// Continues the line on a trailing backslash.
struct BackslashValidator;

impl Validator for BackslashValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        if line.trim_end().ends_with('\\') {
            ValidationResult::Incomplete
        } else {
            ValidationResult::Complete
        }
    }
}

/// Colors slash commands so typos stand out before submitting.
struct CommandHighlighter;

impl reedline::Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> reedline::StyledText {
        let mut styled = reedline::StyledText::new();
        if line.trim_start().starts_with('/') {
            styled.push((Style::new().fg(Color::Cyan), line.to_string()));
        } else {
            styled.push((Style::new(), line.to_string()));
        }
        styled
    }
}

pub struct ChatInput {
    editor: Reedline,
    prompt: ChatPrompt,
}

impl ChatInput {
    pub fn new(persona: Persona) -> Result<Self> {
        let history_path = history_path();
        if let Some(parent) = history_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create history directory: {parent:?}"))?;
        }
        let history = Box::new(
            FileBackedHistory::with_file(HISTORY_CAPACITY, history_path)
                .context("failed to open composer history")?,
        );

        let editor = Reedline::create()
            .with_history(history)
            .with_validator(Box::new(BackslashValidator))
            .with_highlighter(Box::new(CommandHighlighter));

        Ok(Self {
            editor,
            prompt: ChatPrompt {
                persona: persona.to_string(),
            },
        })
    }

    /// Shown in the prompt so the active persona stays visible.
    pub fn set_persona(&mut self, persona: Persona) {
        self.prompt.persona = persona.to_string();
    }

    /// Block until the user submits a non-empty line or signals.
    pub fn read_line(&mut self) -> Result<InputEvent> {
        loop {
            match self.editor.read_line(&self.prompt)? {
                Signal::Success(buffer) => {
                    if buffer.trim().is_empty() {
                        continue;
                    }
                    return Ok(InputEvent::Submitted(join_continuations(&buffer)));
                }
                Signal::CtrlC => return Ok(InputEvent::Interrupted),
                Signal::CtrlD => return Ok(InputEvent::Exit),
            }
        }
    }

    /// Ask a one-off question; None when the user backs out.
    pub fn read_value(&mut self, label: &str) -> Result<Option<String>> {
        let prompt = LabelPrompt {
            label: label.to_string(),
        };
        match self.editor.read_line(&prompt)? {
            Signal::Success(line) => Ok(Some(line.trim().to_string())),
            Signal::CtrlC | Signal::CtrlD => Ok(None),
        }
    }
}

/// Strip trailing backslashes and join continued lines with spaces.
fn join_continuations(buffer: &str) -> String {
    buffer
        .lines()
        .map(|line| line.trim_end_matches('\\').trim_end())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parley")
        .join("history")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslash_validator_continues_only_on_trailing_backslash() {
        let validator = BackslashValidator;
        assert!(matches!(
            validator.validate("first line\\"),
            ValidationResult::Incomplete
        ));
        assert!(matches!(
            validator.validate("done"),
            ValidationResult::Complete
        ));
    }

    #[test]
    fn continuations_join_into_a_single_line() {
        assert_eq!(join_continuations("one\\\ntwo\\\nthree"), "one two three");
        assert_eq!(join_continuations("plain"), "plain");
    }
}
