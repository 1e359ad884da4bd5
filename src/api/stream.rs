//! Streamed reply consumption: a stateful UTF-8 decoder plus the adapter
//! that turns a raw HTTP byte stream into a finite sequence of decoded text
//! fragments.
//!
//! The endpoint writes plain text incrementally (no framing, no event
//! protocol), so chunk boundaries can land anywhere — including inside a
//! multi-byte character. The decoder carries those partial sequences across
//! reads instead of decoding each chunk in isolation.

use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::utils::error::{ApiError, DecodeError};

/// A finite, non-restartable stream of decoded reply fragments. The first
/// error is terminal.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ApiError>> + Send>>;

/// Incremental UTF-8 decoder holding incomplete trailing sequences between
/// chunks.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all complete characters seen so far.
    /// An incomplete trailing sequence is kept for the next call; a sequence
    /// that can never become valid is a terminal error.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        self.pending.extend_from_slice(chunk);
        let buf = std::mem::take(&mut self.pending);

        match std::str::from_utf8(&buf) {
            Ok(text) => Ok(text.to_string()),
            Err(err) => {
                let valid = err.valid_up_to();
                if err.error_len().is_some() {
                    return Err(DecodeError::InvalidSequence { offset: valid });
                }
                // Only the tail is incomplete; everything before it decodes.
                let text = String::from_utf8_lossy(&buf[..valid]).into_owned();
                self.pending = buf[valid..].to_vec();
                Ok(text)
            }
        }
    }

    /// Signal end-of-stream. Leftover bytes mean the reply body ended inside
    /// a multi-byte character.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TruncatedCharacter)
        }
    }
}

/// Wrap a streaming HTTP response body into a [`ReplyStream`] of decoded
/// text fragments.
pub fn reply_stream(response: reqwest::Response) -> ReplyStream {
    Box::pin(async_stream::try_stream! {
        let mut decoder = Utf8Decoder::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            let text = decoder.decode(&chunk)?;
            if !text.is_empty() {
                yield text;
            }
        }

        decoder.finish()?;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_chunks_pass_through() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"Hel").unwrap(), "Hel");
        assert_eq!(decoder.decode(b"lo, ").unwrap(), "lo, ");
        assert_eq!(decoder.decode(b"world!").unwrap(), "world!");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn two_byte_character_split_across_chunks() {
        // "é" is 0xC3 0xA9.
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[0x63, 0x61, 0x66, 0xC3]).unwrap(), "caf");
        assert_eq!(decoder.decode(&[0xA9]).unwrap(), "é");
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn four_byte_character_split_at_every_boundary() {
        let rocket = "🚀".as_bytes();
        for split in 1..rocket.len() {
            let mut decoder = Utf8Decoder::new();
            let mut out = String::new();
            out.push_str(&decoder.decode(&rocket[..split]).unwrap());
            out.push_str(&decoder.decode(&rocket[split..]).unwrap());
            assert_eq!(out, "🚀", "split at byte {split}");
            assert!(decoder.finish().is_ok());
        }
    }

    #[test]
    fn invalid_sequence_is_a_terminal_error() {
        let mut decoder = Utf8Decoder::new();
        let err = decoder.decode(&[0x68, 0x69, 0xFF, 0x68]).unwrap_err();
        assert_eq!(err, DecodeError::InvalidSequence { offset: 2 });
    }

    #[test]
    fn stream_ending_mid_character_is_an_error() {
        let mut decoder = Utf8Decoder::new();
        // First three bytes of "🚀".
        assert_eq!(decoder.decode(&[0xF0, 0x9F, 0x9A]).unwrap(), "");
        assert_eq!(decoder.finish().unwrap_err(), DecodeError::TruncatedCharacter);
    }

    #[test]
    fn empty_chunks_are_harmless() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"").unwrap(), "");
        assert_eq!(decoder.decode(b"ok").unwrap(), "ok");
        assert!(decoder.finish().is_ok());
    }
}
