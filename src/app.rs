//! Ties the session store, the visible conversation and the chat client
//! together.

use crate::api::{ChatClient, ChatTransport, history_for_api};
use crate::core::{Message, SessionStore};
use crate::error::{Error, Result};
use crate::render::ConversationView;
use tracing::{debug, warn};

/// A chat front end: one store, one view of the active session, one client.
#[derive(Debug)]
pub struct ChatApp<T> {
    store: SessionStore,
    view: ConversationView,
    client: ChatClient<T>,
}

impl<T: ChatTransport> ChatApp<T> {
    /// Build the app and show the active session.
    pub fn new(store: SessionStore, client: ChatClient<T>) -> Self {
        let mut app = Self {
            store,
            view: ConversationView::new(),
            client,
        };
        app.view.replay(app.store.active());
        app
    }

    /// The session store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Mutable access to the session store.
    pub fn store_mut(&mut self) -> &mut SessionStore {
        &mut self.store
    }

    /// The visible conversation.
    pub fn view(&self) -> &ConversationView {
        &self.view
    }

    /// Mutable access to the visible conversation, e.g. to add observers.
    pub fn view_mut(&mut self) -> &mut ConversationView {
        &mut self.view
    }

    /// Ask `question` in the active session.
    ///
    /// Returns the bot reply, or `None` for a blank question. Service
    /// failures are not errors: they come back as bot messages and are
    /// recorded like any answer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestInFlight`] if the session is already waiting
    /// for an answer, or a storage error if persisting fails.
    pub async fn submit(&mut self, question: &str) -> Result<Option<Message>> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }

        let session_id = self.store.active_id().to_string();
        self.store.begin_request(&session_id)?;

        let result = self.exchange(&session_id, question).await;
        self.store.finish_request(&session_id);
        result.map(Some)
    }

    async fn exchange(&mut self, session_id: &str, question: &str) -> Result<Message> {
        let user = Message::user(question);
        self.store.append_message(session_id, user.clone())?;
        self.view.push(&user);
        self.view.show_pending();

        let history = self
            .store
            .session(session_id)
            .map(|session| history_for_api(&session.messages))
            .unwrap_or_default();
        let reply = self.client.ask(question, history).await;

        self.view.clear_pending();
        let recorded = self.store.append_message(session_id, reply.clone());
        if self.store.active_id() == session_id {
            self.view.push(&reply);
        }
        if let Err(e) = &recorded {
            warn!(session = %session_id, "failed to persist reply: {e}");
        }
        recorded.map(|()| reply)
    }

    /// Start a new session and show it.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn new_session(&mut self) -> Result<String> {
        let id = self.store.create_session()?;
        self.view.replay(self.store.active());
        Ok(id)
    }

    /// Switch to session `id` and show it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] for an unknown id, or an error if
    /// persisting fails.
    pub fn switch_session(&mut self, id: &str) -> Result<()> {
        self.store.switch_session(id)?;
        self.view.replay(self.store.active());
        Ok(())
    }

    /// Delete the active session once `confirm` agrees, then show whichever
    /// session became active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LastSession`] when only one session exists, or an
    /// error if persisting fails.
    pub fn delete_active_session(
        &mut self,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<Option<String>> {
        let removed = match self.store.delete_active_session(confirm) {
            Err(Error::LastSession) => {
                debug!("refused to delete the last session");
                return Err(Error::LastSession);
            }
            other => other?,
        };
        self.view.replay(self.store.active());
        Ok(removed)
    }
}
