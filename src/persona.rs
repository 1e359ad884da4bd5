//! Personas: canned system-message templates selectable before the first
//! turn of a conversation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    #[default]
    Helper,
    Coder,
    Translator,
    Storyteller,
}

impl Persona {
    pub fn all() -> &'static [Persona] {
        &[
            Persona::Helper,
            Persona::Coder,
            Persona::Translator,
            Persona::Storyteller,
        ]
    }

    /// The system instruction seeded into a new conversation.
    pub fn template(&self) -> &'static str {
        match self {
            Persona::Helper => {
                "You are a friendly, knowledgeable assistant. Answer clearly and \
                 concisely, and ask for clarification when a request is ambiguous."
            }
            Persona::Coder => {
                "You are an experienced software engineer. Explain reasoning briefly, \
                 prefer working code examples, and point out pitfalls in the user's \
                 approach when you see them."
            }
            Persona::Translator => {
                "You are a careful translator. Detect the source language, translate \
                 faithfully, and preserve tone and formatting. Note genuinely \
                 ambiguous phrases instead of guessing silently."
            }
            Persona::Storyteller => {
                "You are an imaginative storyteller. Build on the user's prompts with \
                 vivid, coherent narration and keep continuity with everything told \
                 so far."
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Persona::Helper => "general-purpose assistant",
            Persona::Coder => "programming help and code review",
            Persona::Translator => "translation between languages",
            Persona::Storyteller => "collaborative fiction",
        }
    }

    pub fn from_name(name: &str) -> Option<Persona> {
        match name.trim().to_lowercase().as_str() {
            "helper" => Some(Persona::Helper),
            "coder" => Some(Persona::Coder),
            "translator" => Some(Persona::Translator),
            "storyteller" => Some(Persona::Storyteller),
            _ => None,
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Persona::Helper => write!(f, "helper"),
            Persona::Coder => write!(f, "coder"),
            Persona::Translator => write!(f, "translator"),
            Persona::Storyteller => write!(f, "storyteller"),
        }
    }
}

impl std::str::FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Persona::from_name(s).ok_or_else(|| format!("unknown persona: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_persona_round_trips_through_its_name() {
        for persona in Persona::all() {
            let name = persona.to_string();
            assert_eq!(Persona::from_name(&name), Some(*persona));
        }
    }

    #[test]
    fn parsing_is_case_insensitive_and_trims() {
        assert_eq!(Persona::from_name("  Coder "), Some(Persona::Coder));
        assert_eq!(Persona::from_name("TRANSLATOR"), Some(Persona::Translator));
        assert_eq!(Persona::from_name("poet"), None);
    }

    #[test]
    fn templates_and_descriptions_are_non_empty() {
        for persona in Persona::all() {
            assert!(!persona.template().is_empty());
            assert!(!persona.description().is_empty());
        }
    }
}
