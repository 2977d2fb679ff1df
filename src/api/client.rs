//! Chat service client.
//!
//! Every outcome of a request, including transport failures and error
//! statuses, becomes a bot [`Message`] so it can be recorded in the
//! conversation.

use crate::api::types::{ChatRequest, ChatResponse, ErrorBody, HistoryEntry};
use crate::core::Message;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// The request never produced a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

impl RawResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a chat request to the service.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post `request` and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response was received.
    async fn post_chat(&self, request: &ChatRequest) -> Result<RawResponse, TransportError>;
}

/// Client for the question-answering service.
#[derive(Debug)]
pub struct ChatClient<T> {
    transport: T,
}

impl<T: ChatTransport> ChatClient<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Ask `question` with the given prior turns and return the bot reply.
    pub async fn ask(&self, question: &str, history: Vec<HistoryEntry>) -> Message {
        let request = ChatRequest {
            question: question.to_string(),
            chat_history: history,
        };
        debug!(turns = request.chat_history.len(), "sending chat request");

        match self.transport.post_chat(&request).await {
            Ok(response) => response_to_message(&response),
            Err(e) => {
                warn!("chat request failed: {e}");
                error_message(&e.to_string(), None)
            }
        }
    }
}

/// Map a completed exchange to a bot message.
#[must_use]
pub fn response_to_message(response: &RawResponse) -> Message {
    if !response.is_success() {
        let body: ErrorBody = serde_json::from_str(&response.body).unwrap_or_default();
        let reason = body
            .error
            .unwrap_or_else(|| format!("HTTP error! status: {}", response.status));
        warn!(status = response.status, "chat service returned an error: {reason}");
        return error_message(&reason, body.sql_query);
    }

    match serde_json::from_str::<ChatResponse>(&response.body) {
        Ok(answer) => Message::from(answer),
        Err(e) => {
            warn!("undecodable chat response: {e}");
            error_message(&e.to_string(), None)
        }
    }
}

fn error_message(reason: &str, sql_query: Option<String>) -> Message {
    let mut message = Message::bot_text(format!("Error: {reason}"));
    message.sql_query = sql_query;
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Content, Visualization};
    use std::sync::Mutex;

    struct CannedTransport {
        reply: Result<RawResponse, TransportError>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl CannedTransport {
        fn new(reply: Result<RawResponse, TransportError>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for CannedTransport {
        async fn post_chat(&self, request: &ChatRequest) -> Result<RawResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    fn ok(body: &str) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    #[tokio::test]
    async fn success_becomes_bot_message() {
        let client = ChatClient::new(CannedTransport::new(ok(
            r#"{"data":[{"depth":10}],"sql_query":"SELECT depth FROM m","visualization":"histogram"}"#,
        )));

        let message = client.ask("depth distribution", Vec::new()).await;
        assert!(matches!(message.content, Content::Records(ref rows) if rows.len() == 1));
        assert_eq!(message.visualization, Some(Visualization::Histogram));
        assert_eq!(message.sql_query.as_deref(), Some("SELECT depth FROM m"));

        let seen = client.transport().seen.lock().unwrap();
        assert_eq!(seen[0].question, "depth distribution");
    }

    #[tokio::test]
    async fn text_answer() {
        let client = ChatClient::new(CannedTransport::new(ok(r#"{"data":"There are 42 floats."}"#)));
        let message = client.ask("how many?", Vec::new()).await;
        assert_eq!(message.text(), Some("There are 42 floats."));
        assert!(message.visualization.is_none());
    }

    #[tokio::test]
    async fn error_status_uses_payload_message() {
        let client = ChatClient::new(CannedTransport::new(Ok(RawResponse {
            status: 500,
            body: r#"{"error":"Failed to execute the generated SQL query.","sql_query":"SELECT nope","details":"syntax"}"#
                .to_string(),
        })));

        let message = client.ask("q", Vec::new()).await;
        assert_eq!(
            message.text(),
            Some("Error: Failed to execute the generated SQL query.")
        );
        assert_eq!(message.sql_query.as_deref(), Some("SELECT nope"));
    }

    #[tokio::test]
    async fn error_status_without_payload_uses_status() {
        let client = ChatClient::new(CannedTransport::new(Ok(RawResponse {
            status: 502,
            body: "<html>Bad Gateway</html>".to_string(),
        })));

        let message = client.ask("q", Vec::new()).await;
        assert_eq!(message.text(), Some("Error: HTTP error! status: 502"));
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_message() {
        let client = ChatClient::new(CannedTransport::new(Err(TransportError(
            "connection refused".to_string(),
        ))));

        let message = client.ask("q", Vec::new()).await;
        assert_eq!(message.text(), Some("Error: connection refused"));
    }

    #[test]
    fn undecodable_success_body_is_an_error() {
        let message = response_to_message(&RawResponse {
            status: 200,
            body: r#"{"unexpected":true}"#.to_string(),
        });
        assert!(message.text().is_some_and(|t| t.starts_with("Error: ")));
    }
}
