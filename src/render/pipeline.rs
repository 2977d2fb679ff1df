//! Message rendering and the visible conversation.

use crate::core::{Content, Message, Role, Session, Visualization};
use crate::render::dispatch::{Visual, dispatch};
use std::fmt;

/// Notice shown for a structured answer with zero rows.
pub const NO_RESULTS: &str = "Query returned no results.";

/// Text of the pending placeholder.
pub const PENDING_TEXT: &str = "Orca AI is thinking...";

/// Label of the collapsed SQL region.
pub const SQL_SUMMARY: &str = "View SQL Query";

/// Main body of a rendered message.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Verbatim text.
    Text(String),
    /// Fixed informational notice.
    Notice(&'static str),
    /// A chart or table.
    Visual(Visual),
    /// The declared visualization did not fit the data.
    Diagnostic(String),
}

/// Collapsed region showing the SQL behind an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlDetails {
    /// Region label.
    pub summary: &'static str,
    /// The query, verbatim.
    pub query: String,
    /// Regions start collapsed.
    pub expanded: bool,
}

/// Render instructions for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    /// Author.
    pub role: Role,
    /// Main body.
    pub body: Body,
    /// Attached SQL, if the message carried any.
    pub sql: Option<SqlDetails>,
}

/// Turn a message into render instructions.
#[must_use]
pub fn render_message(message: &Message) -> RenderedMessage {
    let body = match (&message.content, &message.visualization) {
        (Content::Text(text), _) => Body::Text(text.clone()),
        (Content::Records(rows), _) if rows.is_empty() => Body::Notice(NO_RESULTS),
        (Content::Records(rows), Some(Visualization::Text)) => {
            Body::Text(serde_json::to_string(rows).unwrap_or_default())
        }
        (Content::Records(rows), tag) => match dispatch(tag.as_ref(), rows) {
            Ok(visual) => Body::Visual(visual),
            Err(mismatch) => Body::Diagnostic(mismatch.to_string()),
        },
    };

    let sql = message.sql_query.as_ref().map(|query| SqlDetails {
        summary: SQL_SUMMARY,
        query: query.clone(),
        expanded: false,
    });

    RenderedMessage {
        role: message.role,
        body,
        sql,
    }
}

/// An entry in the visible conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEntry {
    /// A rendered message.
    Message(RenderedMessage),
    /// The transient "thinking" placeholder. Never persisted.
    Pending,
}

/// Structural change to the visible conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// An entry was added at the end.
    Appended,
    /// An entry was removed.
    Removed,
    /// All entries were replaced.
    Replaced,
}

type Observer = Box<dyn Fn(Mutation, &[ViewEntry]) + Send + Sync>;

/// The conversation currently on screen.
///
/// Every structural change goes through one mutation path, which keeps the
/// welcome placeholder in sync and notifies observers.
pub struct ConversationView {
    entries: Vec<ViewEntry>,
    welcome_visible: bool,
    observers: Vec<Observer>,
}

impl fmt::Debug for ConversationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationView")
            .field("entries", &self.entries)
            .field("welcome_visible", &self.welcome_visible)
            .finish_non_exhaustive()
    }
}

impl Default for ConversationView {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationView {
    /// Create an empty view with the welcome placeholder showing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            welcome_visible: true,
            observers: Vec::new(),
        }
    }

    /// Register an observer called after every structural change.
    pub fn observe(&mut self, observer: impl Fn(Mutation, &[ViewEntry]) + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn mutate(&mut self, mutation: Mutation, change: impl FnOnce(&mut Vec<ViewEntry>)) {
        change(&mut self.entries);
        self.welcome_visible = self.entries.is_empty();
        for observer in &self.observers {
            observer(mutation, &self.entries);
        }
    }

    /// Render and append a message.
    ///
    /// A pending placeholder is removed first so an answer never sits next
    /// to a stale "thinking" indicator.
    pub fn push(&mut self, message: &Message) {
        if message.role == Role::Bot {
            self.clear_pending();
        }
        let rendered = render_message(message);
        self.mutate(Mutation::Appended, |entries| {
            entries.push(ViewEntry::Message(rendered));
        });
    }

    /// Clear the view and render every message of `session`.
    pub fn replay(&mut self, session: &Session) {
        let rendered: Vec<ViewEntry> = session
            .messages
            .iter()
            .map(|message| ViewEntry::Message(render_message(message)))
            .collect();
        self.mutate(Mutation::Replaced, |entries| *entries = rendered);
    }

    /// Show the pending placeholder.
    ///
    /// Returns false if one is already showing.
    pub fn show_pending(&mut self) -> bool {
        if self.has_pending() {
            return false;
        }
        self.mutate(Mutation::Appended, |entries| entries.push(ViewEntry::Pending));
        true
    }

    /// Remove the pending placeholder. Returns whether one was showing.
    pub fn clear_pending(&mut self) -> bool {
        if !self.has_pending() {
            return false;
        }
        self.mutate(Mutation::Removed, |entries| {
            entries.retain(|entry| *entry != ViewEntry::Pending);
        });
        true
    }

    /// Whether the pending placeholder is showing.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.entries.contains(&ViewEntry::Pending)
    }

    /// Whether the welcome placeholder is showing.
    #[must_use]
    pub fn welcome_visible(&self) -> bool {
        self.welcome_visible
    }

    /// Visible entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[ViewEntry] {
        &self.entries
    }
}
