//! Integration tests for the completion client against a mock HTTP endpoint.

use assert_matches::assert_matches;
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley_cli::api::{Backend, CompletionClient, WireMessage, COMPLETIONS_PATH};
use parley_cli::chat::Role;
use parley_cli::{ApiError, ReplyStream};

async fn collect(mut stream: ReplyStream) -> Result<String, ApiError> {
    let mut out = String::new();
    while let Some(item) = stream.next().await {
        out.push_str(&item?);
    }
    Ok(out)
}

fn user(text: &str) -> WireMessage {
    WireMessage {
        role: Role::User,
        text: text.to_string(),
    }
}

#[tokio::test]
async fn streams_the_reply_body_as_text_fragments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("Hello, world!".as_bytes().to_vec(), "text/plain; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::new(server.uri(), "test-key").unwrap();
    let stream = client.stream_reply(vec![user("hi")]).await.unwrap();

    assert_eq!(collect(stream).await.unwrap(), "Hello, world!");
}

#[tokio::test]
async fn sends_the_credential_and_the_full_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(body_json(json!({
            "apiKey": "secret-key",
            "messages": [
                { "role": "system", "text": "be brief" },
                { "role": "user", "text": "hi" },
            ],
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(Vec::new(), "text/plain; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::new(server.uri(), "secret-key").unwrap();
    let history = vec![
        WireMessage {
            role: Role::System,
            text: "be brief".to_string(),
        },
        user("hi"),
    ];
    let stream = client.stream_reply(history).await.unwrap();

    assert_eq!(collect(stream).await.unwrap(), "");
}

#[tokio::test]
async fn a_non_success_status_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let client = CompletionClient::new(server.uri(), "test-key").unwrap();
    let err = client.stream_reply(vec![user("hi")]).await.unwrap_err();

    assert_matches!(
        err,
        ApiError::Server { status: 500, ref message } if message.contains("backend exploded")
    );
}

#[tokio::test]
async fn multibyte_replies_survive_the_transport() {
    let reply = "héllo 🚀 señal 中文";
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(reply.as_bytes().to_vec(), "text/plain; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let client = CompletionClient::new(server.uri(), "test-key").unwrap();
    let stream = client.stream_reply(vec![user("hi")]).await.unwrap();

    assert_eq!(collect(stream).await.unwrap(), reply);
}

#[tokio::test]
async fn a_connection_failure_is_a_network_error() {
    // Nothing listens here.
    let client = CompletionClient::new("http://127.0.0.1:9", "test-key").unwrap();
    let err = client.stream_reply(vec![user("hi")]).await.unwrap_err();

    assert_matches!(err, ApiError::Network(_));
}
