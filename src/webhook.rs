use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::reply::ReplyShape;
use crate::session::SessionId;

/// JSON body posted for every user message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest<'a> {
    pub message: &'a str,
    pub session_id: &'a str,
    /// ISO-8601 UTC, millisecond precision, `Z` suffix
    pub timestamp: String,
}

/// Failures that never reach the conversation; they become apology text
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Endpoint answered with a non-2xx status
    #[error("HTTP error! status: {status}, message: {body}")]
    Status { status: u16, body: String },

    /// Request could not be sent or the body could not be read
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl WebhookError {
    pub fn apology(&self) -> String {
        format!(
            "Sorry, I'm having trouble connecting right now ({}). Please try again later.",
            self
        )
    }
}

/// Client for the chat webhook; one POST per user message
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
    session_id: SessionId,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, session_id: SessionId) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(client, url, session_id))
    }

    /// Build on top of an existing `reqwest::Client`
    pub fn with_client(client: reqwest::Client, url: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            client,
            url: url.into(),
            session_id,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `text` and resolve to the reply to display. Never fails.
    pub async fn send_message(&self, text: &str) -> String {
        match self.exchange(text).await {
            Ok(shape) => shape.into_reply(),
            Err(e) => {
                tracing::error!("Error sending message to webhook: {}", e);
                e.apology()
            }
        }
    }

    /// Perform the round trip and classify a successful body
    pub async fn exchange(&self, text: &str) -> Result<ReplyShape, WebhookError> {
        tracing::info!(session_id = %self.session_id, "Sending message");

        let payload = WebhookRequest {
            message: text,
            session_id: self.session_id.as_str(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let response = self.client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        tracing::info!(status = status.as_u16(), "Response status");
        tracing::debug!(headers = ?response.headers(), "Response headers");

        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Error response body: {}", body);
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        tracing::debug!("Raw response text: {}", body);

        let shape = ReplyShape::classify(&body);
        match &shape {
            ReplyShape::Empty => tracing::warn!("Empty response received from webhook"),
            ReplyShape::PlainText(_) => tracing::debug!("Treating response as plain text"),
            ReplyShape::JsonWithField { field, .. } => tracing::debug!(field = field.key(), "Reply field found"),
            ReplyShape::JsonNoKnownField => tracing::warn!("JSON response carried no known reply field"),
            ReplyShape::ParseError => {}
        }
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::{EMPTY_RESPONSE_REPLY, FORMAT_ISSUE_REPLY, ReplyField};
    use crate::testing::{Canned, TestWebhook, direct_client};

    fn client_for(server: &TestWebhook) -> WebhookClient {
        direct_client(&server.url(), SessionId::from("session_1_abcdefghi".to_string()))
    }

    #[tokio::test]
    async fn json_output_field_is_returned() {
        let server = TestWebhook::start(Canned::ok(r#"{"output":"hi"}"#)).await;
        let reply = client_for(&server).send_message("hello").await;
        assert_eq!(reply, "hi");
        server.shutdown().await;
    }

    #[tokio::test]
    async fn priority_lookup_goes_through_exchange() {
        let server = TestWebhook::start(Canned::ok(r#"{"reply":"a","message":"b"}"#)).await;
        let shape = client_for(&server).exchange("hello").await.unwrap();
        assert_eq!(
            shape,
            ReplyShape::JsonWithField {
                field: ReplyField::Reply,
                value: "a".into()
            }
        );
        server.shutdown().await;
    }

    #[tokio::test]
    async fn empty_body_uses_fallback() {
        let server = TestWebhook::start(Canned::ok("")).await;
        assert_eq!(client_for(&server).send_message("x").await, EMPTY_RESPONSE_REPLY);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn plain_text_body_is_trimmed() {
        let server = TestWebhook::start(Canned::ok("  plain text answer \n")).await;
        assert_eq!(client_for(&server).send_message("x").await, "plain text answer");
        server.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_json_reports_format_issue() {
        let server = TestWebhook::start(Canned::ok(r#"{"output":"#)).await;
        assert_eq!(client_for(&server).send_message("x").await, FORMAT_ISSUE_REPLY);
        server.shutdown().await;
    }

    #[tokio::test]
    async fn server_error_embeds_status_and_body() {
        let server = TestWebhook::start(Canned::status(500, "boom")).await;
        let client = client_for(&server);

        let err = client.exchange("x").await.unwrap_err();
        assert!(matches!(err, WebhookError::Status { status: 500, .. }));

        let reply = client.send_message("x").await;
        assert_eq!(
            reply,
            "Sorry, I'm having trouble connecting right now (HTTP error! status: 500, message: boom). Please try again later."
        );
        server.shutdown().await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_resolves_to_apology() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = direct_client(&format!("http://{}/hook", addr), SessionId::generate());
        let reply = client.send_message("x").await;

        assert!(reply.starts_with("Sorry, I'm having trouble connecting right now ("));
        assert!(reply.ends_with("). Please try again later."));
    }

    #[tokio::test]
    async fn request_body_carries_message_session_and_timestamp() {
        let server = TestWebhook::start(Canned::ok("ok")).await;
        let client = client_for(&server);

        client.send_message(" raw  text ").await;
        client.send_message("second").await;

        let requests = server.requests();
        assert_eq!(requests.len(), 2);

        let first: serde_json::Value = serde_json::from_str(&requests[0]).unwrap();
        assert_eq!(first["message"], " raw  text ");
        assert_eq!(first["sessionId"], "session_1_abcdefghi");
        let timestamp = first["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(timestamp.ends_with('Z'));

        let second: serde_json::Value = serde_json::from_str(&requests[1]).unwrap();
        assert_eq!(second["sessionId"], first["sessionId"]);
        server.shutdown().await;
    }
}
