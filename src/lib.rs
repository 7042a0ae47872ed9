//! duo-chat: a two-account realtime chat client.
//!
//! A static-credential login gate in front of a live message feed. The feed
//! reads from and writes to a [`DocumentStore`](domain::traits::DocumentStore)
//! and draws through a [`ChatView`](domain::traits::ChatView).

pub mod application;
pub mod domain;
pub mod infrastructure;
