use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt;

use crate::application::errors::ValidationError;

/// Accounts compiled into the client. Plaintext on purpose: this gate is a demo
/// placeholder, not a security boundary.
pub static BUILTIN_ACCOUNTS: Lazy<AccountList> = Lazy::new(|| AccountList {
    accounts: vec![
        Account::new("Alice", "alice123"),
        Account::new("Bob", "bob123"),
    ],
});

/// A named account with its stored password
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    password: String,
}

impl Account {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
        }
    }

    /// Exact string comparison against the stored password
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

// Keep the password out of logs.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("password", &"***")
            .finish()
    }
}

/// Ordered list of accounts with unique names
#[derive(Debug, Clone)]
pub struct AccountList {
    accounts: Vec<Account>,
}

impl AccountList {
    pub fn new(accounts: Vec<Account>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        for account in &accounts {
            if !seen.insert(account.name.as_str()) {
                return Err(ValidationError::DuplicateAccount(account.name.clone()));
            }
        }
        Ok(Self { accounts })
    }

    pub fn builtin() -> Self {
        BUILTIN_ACCOUNTS.clone()
    }

    pub fn get(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Resolve user input to an account name: either the exact name or a 1-based index
    pub fn resolve(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        if let Some(account) = self.get(input) {
            return Some(account.name.as_str());
        }
        input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.accounts.get(i))
            .map(|a| a.name.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.accounts.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for AccountList {
    fn default() -> Self {
        Self::builtin()
    }
}
