//! Application services - Login and chat orchestration

pub mod chat_client;
pub mod chat_feed;
pub mod login_gate;

pub use chat_client::ChatClient;
pub use chat_feed::{
    ChatFeed, FeedSettings, PendingSends, RetryPolicy, DEFAULT_COLLECTION, FEED_ERROR_NOTICE,
};
pub use login_gate::LoginGate;
