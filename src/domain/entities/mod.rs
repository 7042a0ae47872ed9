//! Domain entities - Core chat objects with no infrastructure dependencies

pub mod account;
pub mod message;
pub mod session;

pub use account::{Account, AccountList, BUILTIN_ACCOUNTS};
pub use message::{Message, NewMessage, Timestamp};
pub use session::{AuthState, Session};
