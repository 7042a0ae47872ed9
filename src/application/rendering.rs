//! Feed rendering - turns a store snapshot into display rows

use chrono::{DateTime, TimeZone};
use std::fmt;

use crate::domain::entities::{Message, Session, Timestamp};
use crate::domain::traits::Snapshot;

/// Shown in place of an empty username
pub const ANONYMOUS: &str = "Anonymous";

/// Which side of the feed a message sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Own,
    Other,
}

impl Side {
    pub fn as_str(&self) -> &str {
        match self {
            Side::Own => "self",
            Side::Other => "other",
        }
    }
}

/// One row of the feed, ready to draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub id: String,
    pub username: String,
    pub text: String,
    pub time: String,
    pub side: Side,
}

impl fmt::Display for RenderedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.time.is_empty() {
            write!(f, "{}: {}", self.username, self.text)
        } else {
            write!(f, "[{}] {}: {}", self.time, self.username, self.text)
        }
    }
}

/// Render a single message relative to the session and the current time
pub fn render_message<Tz: TimeZone>(msg: &Message, session: &Session, now: &DateTime<Tz>) -> RenderedMessage
where
    Tz::Offset: fmt::Display,
{
    let side = if session.is_self(&msg.username) {
        Side::Own
    } else {
        Side::Other
    };
    let username = if msg.username.is_empty() {
        ANONYMOUS.to_string()
    } else {
        msg.username.clone()
    };

    RenderedMessage {
        id: msg.id.clone(),
        username,
        text: msg.text.clone(),
        time: format_time(&msg.created_at, now),
        side,
    }
}

/// Render a whole snapshot, keeping the store's order
pub fn render_snapshot<Tz: TimeZone>(snapshot: &Snapshot, session: &Session, now: &DateTime<Tz>) -> Vec<RenderedMessage>
where
    Tz::Offset: fmt::Display,
{
    snapshot
        .iter()
        .map(|msg| render_message(msg, session, now))
        .collect()
}

/// `HH:MM` for today, `Mon D, HH:MM` otherwise, empty while pending.
/// "Today" is judged in the time zone of `now`.
pub fn format_time<Tz: TimeZone>(created_at: &Timestamp, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let Some(at) = created_at.resolved() else {
        return String::new();
    };
    let local = at.with_timezone(&now.timezone());

    if local.date_naive() == now.date_naive() {
        local.format("%H:%M").to_string()
    } else {
        local.format("%b %-d, %H:%M").to_string()
    }
}
