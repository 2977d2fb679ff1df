//! CLI command implementations.

pub mod ask;
pub mod list;
pub mod session;
pub mod show;

use crate::config::Config;
use crate::core::SessionStore;
use crate::error::Result;
use crate::storage::FileBackend;
use std::sync::Arc;
use tracing::debug;

/// Open the session store under the configured storage path.
///
/// # Errors
///
/// Returns an error if the storage directory cannot be created.
pub fn open_store(config: &Config) -> Result<SessionStore> {
    let backend = FileBackend::new(config.storage.path.clone())?;
    let mut store = SessionStore::load(Arc::new(backend));
    store.subscribe(|event| debug!(?event, "store changed"));
    Ok(store)
}
