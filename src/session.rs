//! Session control: the send gate, persona seeding, and the fold that merges
//! streamed fragments into the single pending assistant message.
//!
//! The session owns the conversation snapshot and mutates it only through
//! pure operations on the *current* value. Between chunk suspension points
//! the driver may apply other mutations (deleting or editing earlier
//! messages); the next fragment publish recomputes from whatever the store
//! holds then, so those edits are never clobbered.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::client::{Backend, WireMessage};
use crate::chat::Message;
use crate::conversation::Conversation;
use crate::persona::Persona;
use crate::utils::error::{ApiError, TurnError};

/// One in-flight completion turn: the reserved pending-message id and the
/// reply text accumulated from the stream so far.
#[derive(Debug)]
pub struct Turn {
    pending_id: Uuid,
    text: String,
    appended: bool,
}

impl Turn {
    pub fn pending_id(&self) -> Uuid {
        self.pending_id
    }
}

/// Result of publishing one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnProgress {
    /// Fragment merged and a fresh snapshot published.
    Published,
    /// The pending message was deleted out from under the stream; the turn
    /// stops without further store mutations and the gate is released.
    Aborted,
}

/// How a driven turn settled. Partial text already published stays in the
/// store on every variant.
#[derive(Debug)]
pub enum TurnOutcome {
    Completed,
    Failed(ApiError),
    Cancelled,
    Aborted,
}

pub struct ChatSession {
    conversation: Conversation,
    persona: Persona,
    busy: bool,
}

impl ChatSession {
    pub fn new(persona: Persona) -> Self {
        Self {
            conversation: Conversation::new(),
            persona,
            busy: false,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    /// True while a completion turn is streaming; new sends are refused.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Select a persona. Meaningful only before the first turn; the
    /// presentation layer refuses switching once the conversation has begun,
    /// the store itself does not enforce it.
    pub fn set_persona(&mut self, persona: Persona) {
        self.persona = persona;
    }

    pub fn delete_message(&mut self, id: Uuid) {
        self.conversation = self.conversation.delete(id);
    }

    pub fn edit_message(&mut self, id: Uuid, text: &str) {
        self.conversation = self.conversation.edit_text(id, text);
    }

    pub fn clear(&mut self) {
        self.conversation = self.conversation.clear();
    }

    /// Start a turn: seed the persona system message on the very first send,
    /// append the user message, close the gate and reserve the pending
    /// assistant slot.
    pub fn begin_turn(&mut self, input: &str) -> Result<Turn, TurnError> {
        if self.busy {
            return Err(TurnError::Busy);
        }
        let input = input.trim();
        if input.is_empty() {
            return Err(TurnError::EmptyInput);
        }

        if self.conversation.is_empty() {
            self.conversation = self
                .conversation
                .append(Message::system(self.persona.template()));
        }
        self.conversation = self.conversation.append(Message::user(input));
        self.busy = true;

        Ok(Turn {
            pending_id: Uuid::new_v4(),
            text: String::new(),
            appended: false,
        })
    }

    /// The wire history for the request; presentation-only fields stay
    /// behind.
    pub fn history(&self) -> Vec<WireMessage> {
        self.conversation.messages().iter().map(WireMessage::from).collect()
    }

    /// Merge one decoded fragment into the pending assistant message and
    /// publish a fresh snapshot. The first fragment appends the pending
    /// message; later ones rewrite its text with the full accumulated reply,
    /// which also overwrites any mid-stream edit of the pending entry.
    pub fn absorb_fragment(&mut self, turn: &mut Turn, fragment: &str) -> TurnProgress {
        turn.text.push_str(fragment);

        if !turn.appended {
            let pending = Message::assistant(turn.text.clone()).with_id(turn.pending_id);
            self.conversation = self.conversation.append(pending);
            turn.appended = true;
            TurnProgress::Published
        } else if self.conversation.contains(turn.pending_id) {
            self.conversation = self.conversation.edit_text(turn.pending_id, &turn.text);
            TurnProgress::Published
        } else {
            tracing::debug!(pending = %turn.pending_id, "pending message deleted, aborting turn");
            self.busy = false;
            TurnProgress::Aborted
        }
    }

    /// Release the gate after the stream completed; the final publish
    /// already carries the full text.
    pub fn finish_turn(&mut self, _turn: Turn) {
        self.busy = false;
    }

    /// Release the gate after a failure or cancellation. Partial text
    /// already published stays visible; nothing is retracted.
    pub fn settle_failed(&mut self, _turn: Turn) {
        self.busy = false;
    }
}

/// Drive one full turn against a backend: issue the request, fold the
/// fragment stream into the session, and release the gate on every exit
/// path. `on_fragment` fires after each publish so the presentation layer
/// can render the delta.
pub async fn drive_turn<B>(
    session: &mut ChatSession,
    backend: &B,
    input: &str,
    cancel: &CancellationToken,
    mut on_fragment: impl FnMut(&str),
) -> Result<TurnOutcome, TurnError>
where
    B: Backend + ?Sized,
{
    let mut turn = session.begin_turn(input)?;
    let history = session.history();

    let mut stream = match backend.stream_reply(history).await {
        Ok(stream) => stream,
        Err(err) => {
            session.settle_failed(turn);
            return Ok(TurnOutcome::Failed(err));
        }
    };

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("turn cancelled");
                session.settle_failed(turn);
                return Ok(TurnOutcome::Cancelled);
            }
            item = stream.next() => match item {
                Some(Ok(fragment)) => {
                    if session.absorb_fragment(&mut turn, &fragment) == TurnProgress::Aborted {
                        return Ok(TurnOutcome::Aborted);
                    }
                    on_fragment(&fragment);
                }
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "turn failed mid-stream");
                    session.settle_failed(turn);
                    return Ok(TurnOutcome::Failed(err));
                }
                None => {
                    session.finish_turn(turn);
                    return Ok(TurnOutcome::Completed);
                }
            }
        }
    }
}
