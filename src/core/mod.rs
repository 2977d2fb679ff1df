//! Core session types and the session store.

pub mod state;
pub mod store;

pub use state::{Content, DEFAULT_TITLE, Message, Record, Role, Session, Visualization, record};
pub use store::{ACTIVE_ID_KEY, HISTORY_KEY, SessionStore, StoreEvent};
