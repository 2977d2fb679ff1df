//! `floatchat list` command implementation.

use crate::cli::open_store;
use crate::config::load_config;
use crate::core::SessionStore;
use crate::error::Result;

/// Maximum length for title preview.
const TITLE_PREVIEW_LEN: usize = 50;

/// Run the list command.
///
/// Shows every session in creation order, marking the active one.
///
/// # Errors
///
/// Returns an error if configuration or storage fails.
pub fn run() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;

    print!("{}", format_history(&store));
    Ok(())
}

/// Format the session history list.
#[must_use]
pub fn format_history(store: &SessionStore) -> String {
    let mut out = format!("  {:<38} {:>8}  Title\n", "Session ID", "Messages");
    out.push_str(&"─".repeat(90));
    out.push('\n');

    for session in store.sessions() {
        let marker = if session.id == store.active_id() { '*' } else { ' ' };
        out.push_str(&format!(
            "{marker} {:<38} {:>8}  {}\n",
            session.id,
            session.messages.len(),
            format_title_preview(&session.title)
        ));
    }

    out.push_str(&"─".repeat(90));
    out.push_str(&format!("\n{} session(s)\n", store.len()));
    out
}

/// Format title preview, truncating if needed.
fn format_title_preview(title: &str) -> String {
    let first_line = title.lines().next().unwrap_or(title);
    if first_line.chars().count() > TITLE_PREVIEW_LEN {
        let cut: String = first_line.chars().take(TITLE_PREVIEW_LEN).collect();
        format!("{cut}...")
    } else {
        first_line.to_string()
    }
}
