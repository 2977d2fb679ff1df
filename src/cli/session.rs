//! `floatchat new`, `switch` and `delete` command implementations.

use crate::cli::open_store;
use crate::config::load_config;
use crate::error::Result;
use std::io::{self, BufRead, Write};

/// Run the new command: create a session and make it active.
///
/// # Errors
///
/// Returns an error if configuration or storage fails.
pub fn run_new() -> Result<()> {
    let config = load_config()?;
    let mut store = open_store(&config)?;

    let id = store.create_session()?;
    println!("Started {id}");
    Ok(())
}

/// Run the switch command.
///
/// # Errors
///
/// Returns an error if the session does not exist or storage fails.
pub fn run_switch(session_id: &str) -> Result<()> {
    let config = load_config()?;
    let mut store = open_store(&config)?;

    store.switch_session(session_id)?;
    println!("Switched to {} ({})", session_id, store.active().title);
    Ok(())
}

/// Run the delete command on the active session.
///
/// Asks for confirmation on stdin unless `yes` is set.
///
/// # Errors
///
/// Returns an error if this is the last session, or if storage fails.
pub fn run_delete(yes: bool) -> Result<()> {
    let config = load_config()?;
    let mut store = open_store(&config)?;

    let removed = store.delete_active_session(|prompt| {
        yes || confirm(prompt, &mut io::stdin().lock(), &mut io::stdout())
    })?;

    match removed {
        Some(id) => println!("Deleted {id}; now on {}", store.active_id()),
        None => println!("Kept {}", store.active_id()),
    }
    Ok(())
}

/// Ask a yes/no question. Anything but `y`/`yes` declines.
fn confirm(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> bool {
    if write!(output, "{prompt} [y/N] ").and_then(|()| output.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
