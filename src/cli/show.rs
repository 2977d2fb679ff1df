//! `floatchat show` command implementation.

use crate::cli::open_store;
use crate::config::load_config;
use crate::core::Session;
use crate::error::{Error, Result};
use crate::render::ConversationView;

/// Run the show command.
///
/// Replays a session (the active one by default) as rendered text.
///
/// # Errors
///
/// Returns an error if the session is not found or storage fails.
pub fn run(session_id: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;

    let session = match session_id {
        Some(id) => store
            .session(id)
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))?,
        None => store.active(),
    };

    print!("{}", format_session(session));
    Ok(())
}

/// Render a whole session for the terminal.
#[must_use]
pub fn format_session(session: &Session) -> String {
    let mut view = ConversationView::new();
    view.replay(session);
    format!("# {}\n\n{view}", session.title)
}
