pub mod client;
pub mod stream;

pub use client::{Backend, CompletionClient, WireMessage, COMPLETIONS_PATH};
pub use stream::{reply_stream, ReplyStream, Utf8Decoder};
