use crate::application::errors::{AuthError, LoginError, ValidationError};
use crate::domain::entities::{AccountList, AuthState, Session};

/// Static-credential login gate
///
/// Holds the account list, the current selection and the session. The only
/// transition is Unauthenticated -> Authenticated on a successful `login`.
pub struct LoginGate {
    accounts: AccountList,
    selected: Option<String>,
    session: Session,
}

impl LoginGate {
    pub fn new(accounts: AccountList) -> Self {
        Self {
            accounts,
            selected: None,
            session: Session::new(),
        }
    }

    pub fn accounts(&self) -> &AccountList {
        &self.accounts
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    /// Mark an account as selected. The selection is frozen once signed in.
    pub fn select_account(&mut self, name: &str) -> Result<(), ValidationError> {
        if let Some(username) = self.session.username() {
            return Err(ValidationError::AlreadyAuthenticated(username.to_string()));
        }
        let account = self
            .accounts
            .get(name)
            .ok_or_else(|| ValidationError::UnknownAccount(name.to_string()))?;
        self.selected = Some(account.name.clone());
        Ok(())
    }

    /// Check `password` against the selected account and open the session
    pub fn login(&mut self, password: &str) -> Result<&Session, LoginError> {
        if let Some(username) = self.session.username() {
            return Err(ValidationError::AlreadyAuthenticated(username.to_string()).into());
        }

        let name = self
            .selected
            .as_deref()
            .ok_or(ValidationError::NoAccountSelected)?;

        let password = password.trim();
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }

        let account = self
            .accounts
            .get(name)
            .ok_or_else(|| ValidationError::UnknownAccount(name.to_string()))?;
        if !account.password_matches(password) {
            tracing::debug!("Rejected password for {}", account.name);
            return Err(AuthError::WrongPassword.into());
        }

        tracing::info!("Signed in as {}", account.name);
        self.session = Session::authenticated(account.name.clone());
        Ok(&self.session)
    }
}

impl Default for LoginGate {
    fn default() -> Self {
        Self::new(AccountList::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::BUILTIN_ACCOUNTS;

    #[test]
    fn test_every_account_logs_in_with_its_password() {
        for (name, password) in [("Alice", "alice123"), ("Bob", "bob123")] {
            let mut gate = LoginGate::default();
            gate.select_account(name).unwrap();
            let session = gate.login(password).unwrap();
            assert_eq!(session.username(), Some(name));
            assert_eq!(gate.state(), AuthState::Authenticated);
        }
        assert_eq!(BUILTIN_ACCOUNTS.len(), 2);
    }

    #[test]
    fn test_wrong_password_keeps_unauthenticated() {
        for name in BUILTIN_ACCOUNTS.names() {
            for wrong in ["nope", "ALICE123", "bob1234", "alice123 x"] {
                let mut gate = LoginGate::default();
                gate.select_account(name).unwrap();
                assert_eq!(gate.login(wrong).unwrap_err(), LoginError::Auth(AuthError::WrongPassword));
                assert_eq!(gate.state(), AuthState::Unauthenticated);
                assert_eq!(gate.session().username(), None);
            }
        }
    }

    #[test]
    fn test_other_accounts_password_is_rejected() {
        let mut gate = LoginGate::default();
        gate.select_account("Alice").unwrap();
        assert_eq!(gate.login("bob123").unwrap_err(), AuthError::WrongPassword.into());
    }

    #[test]
    fn test_login_without_selection_is_validation_error() {
        for password in ["", "alice123", "bob123", "anything"] {
            let mut gate = LoginGate::default();
            assert_eq!(
                gate.login(password).unwrap_err(),
                LoginError::Validation(ValidationError::NoAccountSelected)
            );
            assert_eq!(gate.state(), AuthState::Unauthenticated);
        }
    }

    #[test]
    fn test_selection_is_frozen_after_login() {
        let mut gate = LoginGate::default();
        gate.select_account("Alice").unwrap();
        gate.login("alice123").unwrap();

        assert_eq!(
            gate.select_account("Bob").unwrap_err(),
            ValidationError::AlreadyAuthenticated("Alice".to_string())
        );
        assert_eq!(gate.selected(), Some("Alice"));
    }

    #[test]
    fn test_blank_password_is_validation_error() {
        let mut gate = LoginGate::default();
        gate.select_account("Bob").unwrap();
        assert_eq!(gate.login("   ").unwrap_err(), ValidationError::EmptyPassword.into());
    }

    #[test]
    fn test_password_is_trimmed() {
        let mut gate = LoginGate::default();
        gate.select_account("Bob").unwrap();
        assert!(gate.login("  bob123\n").is_ok());
    }

    #[test]
    fn test_unknown_account_keeps_previous_selection() {
        let mut gate = LoginGate::default();
        gate.select_account("Alice").unwrap();
        assert_eq!(
            gate.select_account("Mallory").unwrap_err(),
            ValidationError::UnknownAccount("Mallory".to_string())
        );
        assert_eq!(gate.selected(), Some("Alice"));
    }

    #[test]
    fn test_second_login_is_rejected() {
        let mut gate = LoginGate::default();
        gate.select_account("Alice").unwrap();
        gate.login("alice123").unwrap();
        gate.select_account("Bob").unwrap();
        assert_eq!(
            gate.login("bob123").unwrap_err(),
            ValidationError::AlreadyAuthenticated("Alice".to_string()).into()
        );
        assert_eq!(gate.session().username(), Some("Alice"));
    }
}
