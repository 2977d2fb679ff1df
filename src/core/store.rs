//! Multi-session store with durable persistence.
//!
//! The store always holds at least one session and its active id always
//! names one of them. Every mutating operation flushes to the injected
//! [`KeyValueStore`] before returning.

use crate::core::state::{Message, Role, Session};
use crate::error::{Error, Result};
use crate::storage::KeyValueStore;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Storage key holding the JSON map of sessions.
pub const HISTORY_KEY: &str = "floatChatHistory";

/// Storage key holding the active session id.
pub const ACTIVE_ID_KEY: &str = "floatChatActiveId";

/// Change notifications delivered to store listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Sessions were added or removed, or a title changed.
    HistoryChanged,
    /// A different session became active.
    ActiveChanged(String),
    /// A message was appended to a session.
    MessageAppended {
        /// Session that received the message.
        session_id: String,
        /// Position of the new message.
        index: usize,
    },
}

type Listener = Box<dyn Fn(&StoreEvent) + Send + Sync>;

/// Owns all sessions and the active-session pointer.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    sessions: IndexMap<String, Session>,
    active_id: String,
    in_flight: HashSet<String>,
    synced: HashMap<String, usize>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.len())
            .field("active_id", &self.active_id)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Load the store from `storage`.
    ///
    /// Missing or corrupt state yields a store with one fresh session.
    /// Never fails; persistence errors are logged.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let mut store = Self {
            storage,
            sessions: IndexMap::new(),
            active_id: String::new(),
            in_flight: HashSet::new(),
            synced: HashMap::new(),
            listeners: Vec::new(),
        };
        store.reload();
        store
    }

    /// Re-read persisted state, falling back to the last session or a new one.
    fn reload(&mut self) {
        self.sessions = read_sessions(self.storage.as_ref());
        self.synced = message_counts(&self.sessions);

        if self.sessions.is_empty() {
            let session = Session::new(&generate_session_id());
            if let Err(e) = self.insert_session(session.clone()) {
                warn!("failed to persist fresh session, keeping it in memory: {e}");
                self.active_id.clone_from(&session.id);
                self.sessions.insert(session.id.clone(), session);
                self.notify(&StoreEvent::HistoryChanged);
                self.notify(&StoreEvent::ActiveChanged(self.active_id.clone()));
            }
            return;
        }

        let persisted = match self.storage.get(ACTIVE_ID_KEY) {
            Ok(id) => id,
            Err(e) => {
                warn!("failed to read active session id: {e}");
                None
            }
        };

        self.active_id = match persisted {
            Some(id) if self.sessions.contains_key(&id) => id,
            _ => self.last_session_id(),
        };
        debug!(
            sessions = self.sessions.len(),
            active = %self.active_id,
            "loaded chat sessions"
        );
        self.notify(&StoreEvent::HistoryChanged);
        self.notify(&StoreEvent::ActiveChanged(self.active_id.clone()));
    }

    /// Id of the most recently inserted session.
    fn last_session_id(&self) -> String {
        self.sessions.keys().next_back().cloned().unwrap_or_default()
    }

    /// Register a listener for store changes.
    pub fn subscribe(&mut self, listener: impl Fn(&StoreEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, event: &StoreEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Create a new empty session and make it active.
    ///
    /// Returns the new session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id already exists or persisting fails.
    pub fn create_session(&mut self) -> Result<String> {
        let id = generate_session_id();
        self.insert_session(Session::new(&id))?;
        Ok(id)
    }

    /// Insert `session` and make it active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSession`] if the id is taken, or an error if
    /// persisting fails. On error the store is unchanged.
    pub fn insert_session(&mut self, session: Session) -> Result<()> {
        if self.sessions.contains_key(&session.id) {
            return Err(Error::DuplicateSession(session.id));
        }
        let id = session.id.clone();
        let mut sessions = self.sessions.clone();
        sessions.insert(id.clone(), session);
        self.commit(sessions, Some(id.clone()), None)?;
        debug!(session = %id, "created session");

        self.notify(&StoreEvent::HistoryChanged);
        self.notify(&StoreEvent::ActiveChanged(self.active_id.clone()));
        Ok(())
    }

    /// Make `id` the active session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown id, or an error if
    /// persisting fails. On error the active session is unchanged.
    pub fn switch_session(&mut self, id: &str) -> Result<()> {
        if !self.sessions.contains_key(id) {
            return Err(Error::SessionNotFound(id.to_string()));
        }
        self.storage.set(ACTIVE_ID_KEY, id)?;
        self.active_id = id.to_string();
        self.notify(&StoreEvent::ActiveChanged(self.active_id.clone()));
        Ok(())
    }

    /// Delete the active session after `confirm` agrees.
    ///
    /// Returns the removed id, or `None` if confirmation was declined.
    /// Afterwards the most recently inserted remaining session is active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LastSession`] without touching anything when only one
    /// session exists, or an error if persisting fails. When the history
    /// cannot be written the session is kept and stays active.
    pub fn delete_active_session(
        &mut self,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<Option<String>> {
        if self.sessions.len() <= 1 {
            return Err(Error::LastSession);
        }
        if !confirm("Are you sure you want to delete this chat?") {
            return Ok(None);
        }

        let removed = self.active_id.clone();
        let mut sessions = self.sessions.clone();
        sessions.shift_remove(&removed);
        self.commit(sessions, None, Some(removed.as_str()))?;
        self.in_flight.remove(&removed);
        debug!(session = %removed, active = %self.active_id, "deleted session");

        self.notify(&StoreEvent::HistoryChanged);
        self.notify(&StoreEvent::ActiveChanged(self.active_id.clone()));
        Ok(Some(removed))
    }

    /// Append `message` to a session.
    ///
    /// The first message of a session, when authored by the user, becomes
    /// the session title. Messages appended to the same session by another
    /// store sharing the storage are kept ahead of this one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown id, or an error if
    /// persisting fails. On error the message is not recorded.
    pub fn append_message(&mut self, session_id: &str, message: Message) -> Result<()> {
        let Some(current) = self.sessions.get(session_id) else {
            return Err(Error::SessionNotFound(session_id.to_string()));
        };
        let old_title = current.title.clone();

        let mut sessions = self.sessions.clone();
        if let Some(session) = sessions.get_mut(session_id) {
            if session.messages.is_empty() && message.role == Role::User {
                if let Some(text) = message.text() {
                    session.title = text.to_string();
                }
            }
            session.messages.push(message);
        }
        self.commit(sessions, Some(self.active_id.clone()), None)?;

        let Some(session) = self.sessions.get(session_id) else {
            return Ok(());
        };
        let index = session.messages.len().saturating_sub(1);
        if session.title != old_title {
            self.notify(&StoreEvent::HistoryChanged);
        }
        self.notify(&StoreEvent::MessageAppended {
            session_id: session_id.to_string(),
            index,
        });
        Ok(())
    }

    /// Mark a session as waiting for an answer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestInFlight`] if the session is already waiting,
    /// or [`Error::SessionNotFound`] for an unknown id.
    pub fn begin_request(&mut self, session_id: &str) -> Result<()> {
        if !self.sessions.contains_key(session_id) {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }
        if !self.in_flight.insert(session_id.to_string()) {
            return Err(Error::RequestInFlight(session_id.to_string()));
        }
        Ok(())
    }

    /// Clear the waiting mark set by [`SessionStore::begin_request`].
    pub fn finish_request(&mut self, session_id: &str) {
        self.in_flight.remove(session_id);
    }

    /// Whether a request is outstanding for the session.
    #[must_use]
    pub fn is_busy(&self, session_id: &str) -> bool {
        self.in_flight.contains(session_id)
    }

    /// Active session id.
    #[must_use]
    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The active session.
    ///
    /// # Panics
    ///
    /// Never in practice: the active id always names a stored session.
    #[must_use]
    pub fn active(&self) -> &Session {
        &self.sessions[self.active_id.as_str()]
    }

    /// Look up a session by id.
    #[must_use]
    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Sessions in insertion order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions. Never true once loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Merge `sessions` with the persisted history, write it, then adopt it.
    ///
    /// The history write is the commit point: if it fails nothing in memory
    /// changes. `active` falls back to the last session when absent or gone.
    /// `dropped` names a session being deleted, which is not merged back.
    fn commit(
        &mut self,
        mut sessions: IndexMap<String, Session>,
        active: Option<String>,
        dropped: Option<&str>,
    ) -> Result<()> {
        self.merge_persisted(&mut sessions, dropped);
        let json = serde_json::to_string(&sessions)?;
        self.storage.set(HISTORY_KEY, &json)?;

        self.active_id = match active {
            Some(id) if sessions.contains_key(&id) => id,
            _ => sessions.keys().next_back().cloned().unwrap_or_default(),
        };
        self.synced = message_counts(&sessions);
        self.sessions = sessions;
        self.storage.set(ACTIVE_ID_KEY, &self.active_id)
    }

    /// Fold in sessions and messages another store wrote since our last sync.
    ///
    /// Messages are append-only, so anything persisted past the count we last
    /// saw for a session goes ahead of our own unsynced messages.
    fn merge_persisted(&self, sessions: &mut IndexMap<String, Session>, dropped: Option<&str>) {
        for (id, theirs) in read_sessions(self.storage.as_ref()) {
            if dropped == Some(id.as_str()) {
                continue;
            }
            if !sessions.contains_key(&id) {
                debug!(session = %id, "picked up session written elsewhere");
                sessions.insert(id, theirs);
                continue;
            }
            let Some(ours) = sessions.get_mut(&id) else {
                continue;
            };
            let base = self.synced.get(&id).copied().unwrap_or(0);
            if theirs.messages.len() <= base {
                continue;
            }
            debug!(
                session = %id,
                foreign = theirs.messages.len() - base,
                "merging messages written elsewhere"
            );
            let keep_from = base.min(ours.messages.len());
            let local: Vec<Message> = ours.messages.drain(keep_from..).collect();
            if base == 0 {
                ours.title = theirs.title;
            }
            ours.messages = theirs.messages;
            ours.messages.extend(local);
        }
    }
}

fn message_counts(sessions: &IndexMap<String, Session>) -> HashMap<String, usize> {
    sessions
        .iter()
        .map(|(id, session)| (id.clone(), session.messages.len()))
        .collect()
}

/// Read the persisted session map, treating any failure as "no state".
///
/// Entries are keyed by their own session id; an entry stored under a
/// different key is re-keyed and a repeated id is dropped.
fn read_sessions(storage: &dyn KeyValueStore) -> IndexMap<String, Session> {
    let raw = match storage.get(HISTORY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return IndexMap::new(),
        Err(e) => {
            warn!("failed to read chat history, starting fresh: {e}");
            return IndexMap::new();
        }
    };
    if raw.trim().is_empty() {
        return IndexMap::new();
    }
    let parsed: IndexMap<String, Session> = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("discarding corrupt chat history: {e}");
            return IndexMap::new();
        }
    };

    let mut sessions = IndexMap::with_capacity(parsed.len());
    for (key, session) in parsed {
        if key != session.id {
            warn!(key = %key, session = %session.id, "re-keying session stored under another id");
        }
        if sessions.contains_key(&session.id) {
            warn!(session = %session.id, "dropping repeated session id");
            continue;
        }
        sessions.insert(session.id.clone(), session);
    }
    sessions
}

/// Generate a collision-resistant session id.
fn generate_session_id() -> String {
    format!("chat_{}", Uuid::new_v4().simple())
}
