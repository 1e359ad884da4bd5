//! Completion endpoint client.
//!
//! One POST per user turn, carrying the credential and the full ordered
//! history; the response body streams the assistant reply as raw text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::stream::{reply_stream, ReplyStream};
use crate::chat::{Message, Role};
use crate::utils::error::ApiError;

/// Fixed path of the completion endpoint under the configured base URL.
pub const COMPLETIONS_PATH: &str = "/api/completions";

/// Wire form of one transcript entry. Id, sender, avatar and timestamp are
/// presentation-only and never leave the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub text: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    api_key: String,
    messages: Vec<WireMessage>,
}

/// Pluggable transport for completion turns. Production uses
/// [`CompletionClient`]; tests substitute a scripted mock.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issue exactly one completion request for the full history and return
    /// the finite stream of decoded reply fragments.
    async fn stream_reply(&self, messages: Vec<WireMessage>) -> Result<ReplyStream, ApiError>;
}

#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http: streaming_client()?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), COMPLETIONS_PATH)
    }
}

#[async_trait]
impl Backend for CompletionClient {
    async fn stream_reply(&self, messages: Vec<WireMessage>) -> Result<ReplyStream, ApiError> {
        let url = self.completions_url();
        let body = CompletionRequest {
            api_key: self.api_key.clone(),
            messages,
        };

        tracing::debug!(url = %url, history_len = body.messages.len(), "issuing completion request");

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "completion request refused");
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(reply_stream(response))
    }
}

/// Client tuned for streaming completions: bounded connect time, no overall
/// request timeout (the reply can take any length).
fn streaming_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(format!("parley-cli/{}", env!("CARGO_PKG_VERSION")))
        .build()
}
