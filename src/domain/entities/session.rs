/// Authentication state of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// The signed-in user, if any. Lives as long as the client; there is no logout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authenticated(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn state(&self) -> AuthState {
        match self.username {
            Some(_) => AuthState::Authenticated,
            None => AuthState::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    /// True iff `username` is the signed-in user
    pub fn is_self(&self, username: &str) -> bool {
        self.username.as_deref() == Some(username)
    }
}
