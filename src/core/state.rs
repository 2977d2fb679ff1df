//! Session and message types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title given to a session until its first user message arrives.
pub const DEFAULT_TITLE: &str = "New Chat";

/// One row of structured result data, column name to scalar value.
///
/// Column order is the order the server sent them in.
pub type Record = Map<String, Value>;

/// One titled conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Session identifier.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Messages in insertion order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Create an empty session titled "New Chat".
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    /// Whether the session has no messages yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The answering service.
    Bot,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// Message body: free text or rows of structured data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Content {
    /// Plain text.
    Text(String),
    /// Query result rows.
    Records(Vec<Record>),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Record>> for Content {
    fn from(rows: Vec<Record>) -> Self {
        Self::Records(rows)
    }
}

/// Server-supplied label choosing the rendering strategy for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Visualization {
    /// Plain text answer.
    Text,
    /// Vertical profile against pressure.
    LineChart,
    /// Float positions on a map.
    Map,
    /// Temperature/salinity diagram.
    ScatterPlot,
    /// Category counts.
    BarChart,
    /// Distribution of one column.
    Histogram,
    /// A value over time.
    TimeSeries,
    /// Any other tag; rendered as a table.
    Other(String),
}

impl Visualization {
    /// Wire name of the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::LineChart => "line_chart",
            Self::Map => "map",
            Self::ScatterPlot => "scatter_plot",
            Self::BarChart => "bar_chart",
            Self::Histogram => "histogram",
            Self::TimeSeries => "time_series",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for Visualization {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "text" => Self::Text,
            "line_chart" => Self::LineChart,
            "map" => Self::Map,
            "scatter_plot" => Self::ScatterPlot,
            "bar_chart" => Self::BarChart,
            "histogram" => Self::Histogram,
            "time_series" => Self::TimeSeries,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for Visualization {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<Visualization> for String {
    fn from(tag: Visualization) -> Self {
        match tag {
            Visualization::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// One conversation entry. Never modified after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Author.
    pub role: Role,

    /// Body.
    pub content: Content,

    /// SQL the service ran to produce the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,

    /// Suggested rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
}

impl Message {
    /// A question typed by the user.
    #[must_use]
    pub fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            content: Content::from(text),
            sql_query: None,
            visualization: None,
        }
    }

    /// A plain-text bot reply.
    #[must_use]
    pub fn bot_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: Content::Text(text.into()),
            sql_query: None,
            visualization: None,
        }
    }

    /// A bot answer with optional SQL and visualization tag.
    #[must_use]
    pub fn bot(
        content: Content,
        sql_query: Option<String>,
        visualization: Option<Visualization>,
    ) -> Self {
        Self {
            role: Role::Bot,
            content,
            sql_query,
            visualization,
        }
    }

    /// The text body, if this is a text message.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            Content::Records(_) => None,
        }
    }
}

/// Build a record from `(column, value)` pairs, keeping their order.
#[must_use]
pub fn record<I, K>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
