//! Application layer errors

use thiserror::Error;

/// Login input that fails a precondition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an account.")]
    NoAccountSelected,

    #[error("Please enter your password.")]
    EmptyPassword,

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Duplicate account name: {0}")]
    DuplicateAccount(String),

    #[error("Already signed in as {0}")]
    AlreadyAuthenticated(String),
}

/// Credential mismatch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Wrong password.")]
    WrongPassword,
}

/// Anything the login gate can reject
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Document store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Listener error: {0}")]
    Listener(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Chat feed errors
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Subscription failed: {0}")]
    Subscription(#[source] StoreError),

    #[error("Send failed: {0}")]
    Send(#[source] StoreError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
