//! Wire types for the `/api/chat` endpoint.

use crate::core::{Content, Message, Role, Visualization};
use serde::{Deserialize, Serialize};

/// Stand-in sent for structured answers in the history.
pub const VISUALIZATION_PLACEHOLDER: &str = "User asked for a visualization.";

/// One prior turn as sent to the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Author of the turn.
    pub role: Role,
    /// Text of the turn.
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        let content = match &message.content {
            Content::Text(text) => text.clone(),
            Content::Records(_) => VISUALIZATION_PLACEHOLDER.to_string(),
        };
        Self {
            role: message.role,
            content,
        }
    }
}

/// Request body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The new question.
    pub question: String,
    /// Prior turns, oldest first.
    pub chat_history: Vec<HistoryEntry>,
}

/// Successful response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Answer text or result rows.
    pub data: Content,
    /// SQL the service ran.
    #[serde(default)]
    pub sql_query: Option<String>,
    /// Suggested rendering.
    #[serde(default)]
    pub visualization: Option<Visualization>,
}

impl From<ChatResponse> for Message {
    fn from(response: ChatResponse) -> Self {
        Self::bot(response.data, response.sql_query, response.visualization)
    }
}

/// Error response body. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error.
    #[serde(default)]
    pub error: Option<String>,
    /// The SQL that failed, when the service reports it.
    #[serde(default)]
    pub sql_query: Option<String>,
}

/// Build the history sent with a question.
///
/// `messages` is the session after the new question was appended; the last
/// message is left out.
#[must_use]
pub fn history_for_api(messages: &[Message]) -> Vec<HistoryEntry> {
    let prior = messages.split_last().map_or(&[][..], |(_, rest)| rest);
    prior.iter().map(HistoryEntry::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record;
    use serde_json::json;

    #[test]
    fn history_skips_latest_and_collapses_rows() {
        let messages = vec![
            Message::user("where are the floats?"),
            Message::bot(
                Content::Records(vec![record([("latitude", json!(1.0))])]),
                Some("SELECT latitude FROM floats".to_string()),
                Some(Visualization::Map),
            ),
            Message::bot_text("Error: HTTP error! status: 500"),
            Message::user("and their temperatures?"),
        ];

        let history = history_for_api(&messages);
        assert_eq!(
            history,
            vec![
                HistoryEntry {
                    role: Role::User,
                    content: "where are the floats?".to_string()
                },
                HistoryEntry {
                    role: Role::Bot,
                    content: VISUALIZATION_PLACEHOLDER.to_string()
                },
                HistoryEntry {
                    role: Role::Bot,
                    content: "Error: HTTP error! status: 500".to_string()
                },
            ]
        );
    }

    #[test]
    fn history_of_single_message_is_empty() {
        assert!(history_for_api(&[Message::user("q")]).is_empty());
        assert!(history_for_api(&[]).is_empty());
    }

    #[test]
    fn request_serialization() {
        let request = ChatRequest {
            question: "q2".to_string(),
            chat_history: vec![HistoryEntry {
                role: Role::User,
                content: "q1".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"question": "q2", "chat_history": [{"role": "user", "content": "q1"}]})
        );
    }

    #[test]
    fn response_ignores_extra_fields() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"question":"q","data":[{"n":1}],"sql_query":"SELECT 1","visualization":"bar_chart"}"#,
        )
        .unwrap();
        let message = Message::from(response);
        assert_eq!(message.role, Role::Bot);
        assert_eq!(message.visualization, Some(Visualization::BarChart));
        assert_eq!(message.sql_query.as_deref(), Some("SELECT 1"));
    }
}
