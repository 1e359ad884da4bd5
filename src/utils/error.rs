//! Typed errors for the completion client and turn lifecycle.
//!
//! Library code returns these `thiserror` enums; application plumbing wraps
//! them in `anyhow::Result` with context where needed.

use thiserror::Error;

/// Errors from the completion request and its streamed reply.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection-level failure or broken transfer.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The reply body was not valid UTF-8.
    #[error("reply decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Invalid byte sequences in the streamed reply body.
///
/// A multi-byte character split across chunk boundaries is *not* an error;
/// the decoder carries the partial sequence to the next chunk.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid UTF-8 sequence at byte offset {offset}")]
    InvalidSequence { offset: usize },

    #[error("stream ended in the middle of a multi-byte character")]
    TruncatedCharacter,
}

/// Reasons a turn cannot start.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnError {
    #[error("a reply is still streaming; wait for it to finish")]
    Busy,

    #[error("message text is empty")]
    EmptyInput,
}
