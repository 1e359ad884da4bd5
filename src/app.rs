//! Terminal chat driver: reads composer input, routes slash commands, and
//! drives streaming turns against the completion endpoint.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::client::CompletionClient;
use crate::config::{is_valid_key, Settings};
use crate::input::{ChatInput, InputEvent};
use crate::output::OutputHandler;
use crate::persona::Persona;
use crate::session::{drive_turn, ChatSession, TurnOutcome};
use crate::utils::error::TurnError;

enum Flow {
    Continue,
    Quit,
}

pub struct App {
    session: ChatSession,
    client: CompletionClient,
    settings: Settings,
    input: ChatInput,
    output: OutputHandler,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = CompletionClient::new(
            &settings.api_url,
            settings.api_key().unwrap_or_default(),
        )?;
        let input = ChatInput::new(settings.persona)?;

        Ok(Self {
            session: ChatSession::new(settings.persona),
            client,
            settings,
            input,
            output: OutputHandler::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.output
            .print_banner(self.session.persona(), &self.settings.api_url);

        // No send is allowed until a usable credential exists.
        if !self.settings.has_valid_key() {
            self.request_key()?;
        }

        loop {
            match self.input.read_line()? {
                InputEvent::Submitted(line) => {
                    if let Flow::Quit = self.handle_line(&line).await? {
                        break;
                    }
                }
                InputEvent::Interrupted => {
                    self.output.print_info("press ctrl-d or /quit to leave");
                }
                InputEvent::Exit => break,
            }
        }

        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if let Some(command) = line.strip_prefix('/') {
            return self.handle_command(command);
        }
        self.send(line).await?;
        Ok(Flow::Continue)
    }

    fn handle_command(&mut self, command: &str) -> Result<Flow> {
        let mut parts = command.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default().trim();

        match name {
            "help" => self.output.print_help(),
            "show" => self.output.print_transcript(self.session.conversation()),
            "persona" => self.handle_persona(rest),
            "delete" => self.handle_delete(rest),
            "edit" => self.handle_edit(rest),
            "clear" => {
                self.session.clear();
                self.output.print_info("conversation cleared");
            }
            "key" => self.request_key()?,
            "quit" | "exit" => return Ok(Flow::Quit),
            _ => self
                .output
                .print_error(&format!("unknown command: /{name} (try /help)")),
        }

        Ok(Flow::Continue)
    }

    fn handle_persona(&mut self, arg: &str) {
        if arg.is_empty() {
            for persona in Persona::all() {
                let marker = if *persona == self.session.persona() {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {:<12} {}", persona.to_string(), persona.description());
            }
            return;
        }

        // The persona is baked into the seeded system message, so switching
        // stops being meaningful once the conversation has begun.
        if !self.session.conversation().is_empty() {
            self.output
                .print_error("the persona is fixed once the conversation has begun (/clear first)");
            return;
        }

        match Persona::from_name(arg) {
            Some(persona) => {
                self.session.set_persona(persona);
                self.input.set_persona(persona);
                self.settings.persona = persona;
                if let Err(err) = self.settings.save() {
                    tracing::warn!(error = %err, "could not persist persona choice");
                }
                self.output.print_info(&format!("persona set to {persona}"));
            }
            None => self
                .output
                .print_error(&format!("unknown persona: {arg} (try /persona)")),
        }
    }

    fn handle_delete(&mut self, arg: &str) {
        match self.message_id_at(arg) {
            Some(id) => {
                self.session.delete_message(id);
                self.output.print_transcript(self.session.conversation());
            }
            None => self.output.print_error("usage: /delete <n> (see /show)"),
        }
    }

    fn handle_edit(&mut self, arg: &str) {
        let mut parts = arg.splitn(2, char::is_whitespace);
        let index = parts.next().unwrap_or_default();
        let text = parts.next().unwrap_or_default().trim();

        match (self.message_id_at(index), text.is_empty()) {
            (Some(id), false) => {
                self.session.edit_message(id, text);
                self.output.print_transcript(self.session.conversation());
            }
            _ => self
                .output
                .print_error("usage: /edit <n> <new text> (see /show)"),
        }
    }

    /// Map a 1-based transcript number onto a message id.
    fn message_id_at(&self, arg: &str) -> Option<Uuid> {
        let index: usize = arg.parse().ok()?;
        self.session
            .conversation()
            .messages()
            .get(index.checked_sub(1)?)
            .map(|m| m.id)
    }

    async fn send(&mut self, text: &str) -> Result<()> {
        if !self.settings.has_valid_key() {
            self.output
                .print_error("an API key is required before sending");
            self.request_key()?;
            if !self.settings.has_valid_key() {
                return Ok(());
            }
        }

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let spinner = self.output.thinking();
        let mut waiting = true;
        let output = &self.output;

        let outcome = drive_turn(
            &mut self.session,
            &self.client,
            text,
            &cancel,
            |fragment| {
                if waiting {
                    spinner.finish_and_clear();
                    output.print_reply_header();
                    waiting = false;
                }
                output.print_fragment(fragment);
            },
        )
        .await;

        watcher.abort();
        if waiting {
            spinner.finish_and_clear();
        }

        match outcome {
            Ok(TurnOutcome::Completed) => self.output.finish_reply(),
            Ok(TurnOutcome::Failed(err)) => {
                if !waiting {
                    println!();
                }
                self.output.print_error(&err.to_string());
                if !waiting {
                    self.output.print_info("the partial reply stays in the transcript");
                }
            }
            Ok(TurnOutcome::Cancelled) => {
                if !waiting {
                    println!();
                }
                self.output
                    .print_info("cancelled; anything already received stays in the transcript");
            }
            Ok(TurnOutcome::Aborted) => {
                if !waiting {
                    println!();
                }
                self.output.print_info("reply discarded");
            }
            Err(TurnError::EmptyInput) => {}
            Err(err @ TurnError::Busy) => self.output.print_error(&err.to_string()),
        }

        Ok(())
    }

    /// Prompt for a credential until a usable one arrives or the user backs
    /// out; a saved key also rebuilds the client.
    fn request_key(&mut self) -> Result<()> {
        self.output
            .print_info("enter the completion endpoint API key (ctrl-c to skip)");
        loop {
            match self.input.read_value("api key")? {
                None => return Ok(()),
                Some(key) if is_valid_key(&key) => {
                    self.settings.set_api_key(&key);
                    if let Err(err) = self.settings.save() {
                        self.output
                            .print_error(&format!("could not save settings: {err:#}"));
                    }
                    self.client = CompletionClient::new(
                        &self.settings.api_url,
                        self.settings.api_key().unwrap_or_default(),
                    )?;
                    self.output.print_info("key saved");
                    return Ok(());
                }
                Some(_) => self
                    .output
                    .print_error("keys must be non-empty printable ASCII"),
            }
        }
    }
}
