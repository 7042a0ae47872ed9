use std::sync::Arc;
use tokio::task::JoinHandle;

use super::chat_feed::{ChatFeed, FeedSettings};
use super::login_gate::LoginGate;
use crate::application::errors::LoginError;
use crate::domain::entities::{AccountList, Session};
use crate::domain::traits::{ChatView, DocumentStore};

/// Owns the login gate, the session and the live feed for one user of the client
pub struct ChatClient<S: DocumentStore + ?Sized, V: ChatView + ?Sized> {
    gate: LoginGate,
    store: Arc<S>,
    view: Arc<V>,
    settings: FeedSettings,
    feed: Option<ChatFeed<S, V>>,
}

impl<S, V> ChatClient<S, V>
where
    S: DocumentStore + ?Sized + 'static,
    V: ChatView + ?Sized + 'static,
{
    pub fn new(accounts: AccountList, store: Arc<S>, view: Arc<V>, settings: FeedSettings) -> Self {
        Self {
            gate: LoginGate::new(accounts),
            store,
            view,
            settings,
            feed: None,
        }
    }

    pub fn accounts(&self) -> &AccountList {
        self.gate.accounts()
    }

    pub fn session(&self) -> &Session {
        self.gate.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.gate.session().is_authenticated()
    }

    pub fn feed(&self) -> Option<&ChatFeed<S, V>> {
        self.feed.as_ref()
    }

    /// Draw the login choices
    pub fn show_accounts(&self) {
        let names = self.gate.accounts().names();
        self.view.show_accounts(&names, self.gate.selected());
    }

    pub fn select_account(&mut self, name: &str) -> Result<(), LoginError> {
        match self.gate.select_account(name) {
            Ok(()) => {
                self.view.clear_login_error();
                self.show_accounts();
                Ok(())
            }
            // The chat view is up; there is no login form to report on.
            Err(e) if self.is_authenticated() => {
                tracing::debug!("Ignoring account change after login: {}", e);
                Err(e.into())
            }
            Err(e) => {
                self.view.show_login_error(&e.to_string());
                Err(e.into())
            }
        }
    }

    /// Authenticate and, on success, switch to the chat view and start the feed.
    ///
    /// A feed that fails to subscribe does not undo the login; the view shows
    /// the feed error notice instead.
    pub async fn login(&mut self, password: &str) -> Result<(), LoginError> {
        let session = match self.gate.login(password) {
            Ok(session) => session.clone(),
            Err(e) => {
                self.view.show_login_error(&e.to_string());
                return Err(e);
            }
        };

        self.view.clear_password();
        self.view.clear_login_error();
        self.view.show_chat(session.username().unwrap_or_default());

        let feed = ChatFeed::new(
            Arc::clone(&self.store),
            Arc::clone(&self.view),
            session,
            self.settings.clone(),
        );
        if let Err(e) = feed.subscribe().await {
            tracing::warn!("Chat feed unavailable: {}", e);
        }
        self.feed = Some(feed);
        Ok(())
    }

    /// Post a message as the signed-in user
    pub fn send(&self, text: &str) -> Option<JoinHandle<()>> {
        match &self.feed {
            Some(feed) => feed.send(text),
            None => {
                tracing::warn!("Ignoring send before login");
                None
            }
        }
    }

    /// Release the feed's subscription
    pub fn shutdown(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.unsubscribe();
            tracing::info!("Chat closed for {}", feed.session().username().unwrap_or_default());
        }
    }
}
