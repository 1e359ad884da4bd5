pub mod api;
pub mod app;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod input;
pub mod output;
pub mod persona;
pub mod session;
pub mod utils;

pub use api::{Backend, CompletionClient, ReplyStream, WireMessage};
pub use chat::{Message, Role};
pub use config::Settings;
pub use conversation::Conversation;
pub use persona::Persona;
pub use session::{drive_turn, ChatSession, Turn, TurnOutcome, TurnProgress};
pub use utils::error::{ApiError, DecodeError, TurnError};
