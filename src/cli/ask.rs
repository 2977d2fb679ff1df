//! `floatchat ask` command implementation.

use crate::api::{ChatClient, HttpTransport};
use crate::app::ChatApp;
use crate::cli::open_store;
use crate::config::load_config;
use crate::error::Result;
use crate::render::{Mutation, PENDING_TEXT, ViewEntry, render_message};

/// Run the ask command.
///
/// Sends the question in the active session and prints the rendered answer.
///
/// # Errors
///
/// Returns an error if configuration or storage fails, or if the session is
/// already waiting for an answer.
pub async fn run(question: &str) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let transport = HttpTransport::new(&config.api.base_url, config.api.timeout())?;
    let mut app = ChatApp::new(store, ChatClient::new(transport));

    app.view_mut().observe(|mutation, entries| {
        if mutation == Mutation::Appended && entries.last() == Some(&ViewEntry::Pending) {
            eprintln!("{PENDING_TEXT}");
        }
    });

    let Some(reply) = app.submit(question).await? else {
        println!("Nothing to ask.");
        return Ok(());
    };

    print!("{}", render_message(&reply));
    Ok(())
}
