//! Styled terminal rendering: the transcript, streamed reply deltas and the
//! waiting spinner.

use std::io::{self, Write};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::chat::{Message, Role};
use crate::conversation::Conversation;
use crate::persona::Persona;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];

#[derive(Debug, Default)]
pub struct OutputHandler;

impl OutputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn print_banner(&self, persona: Persona, endpoint: &str) {
        println!("{}", style("parley").cyan().bold());
        println!(
            "{}",
            style(format!("persona: {persona} | endpoint: {endpoint}")).dim()
        );
        println!("{}", style("type /help for commands").dim());
        println!();
    }

    pub fn print_help(&self) {
        println!("{}", style("commands").bold());
        println!("  /help                show this help");
        println!("  /show                print the numbered transcript");
        println!("  /persona [name]      list personas, or pick one before the first message");
        println!("  /delete <n>          delete transcript entry n");
        println!("  /edit <n> <text>     replace the text of transcript entry n");
        println!("  /clear               start the conversation over");
        println!("  /key                 enter a new API key");
        println!("  /quit                leave");
        println!("{}", style("ctrl-c while a reply streams cancels it").dim());
    }

    fn header(&self, message: &Message) -> String {
        let label = format!(
            "{} {}  {}",
            message.avatar,
            message.sender,
            message.timestamp.format("%H:%M")
        );
        match message.role {
            Role::System => style(label).yellow().to_string(),
            Role::User => style(label).green().to_string(),
            Role::Assistant => style(label).cyan().to_string(),
        }
    }

    pub fn print_message(&self, message: &Message) {
        println!("{}", self.header(message));
        println!("{}", message.text);
        println!();
    }

    /// Numbered transcript; the numbers feed /delete and /edit.
    pub fn print_transcript(&self, conversation: &Conversation) {
        if conversation.is_empty() {
            println!("{}", style("(empty conversation)").dim());
            return;
        }
        for (index, message) in conversation.messages().iter().enumerate() {
            println!(
                "{} {}",
                style(format!("[{}]", index + 1)).dim(),
                self.header(message)
            );
            println!("{}", message.text);
            println!();
        }
    }

    pub fn print_reply_header(&self) {
        println!("{}", style("● Parley").cyan().bold());
    }

    pub fn print_fragment(&self, fragment: &str) {
        print!("{fragment}");
        let _ = io::stdout().flush();
    }

    pub fn finish_reply(&self) {
        println!();
        println!();
    }

    /// Spinner shown between send and the first streamed fragment.
    pub fn thinking(&self) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(SPINNER_FRAMES),
        );
        spinner.set_message("waiting for reply");
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner
    }

    pub fn print_info(&self, text: &str) {
        println!("{}", style(text).dim());
    }

    pub fn print_error(&self, text: &str) {
        eprintln!("{} {}", style("error:").red().bold(), text);
    }
}
