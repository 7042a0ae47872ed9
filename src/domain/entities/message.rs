use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation time of a message. `Pending` stands in for a server timestamp the
/// store has not resolved yet.
///
/// Serialized as a nullable RFC 3339 string. Orders resolved times first, by
/// time, then pending ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Option<DateTime<Utc>>", into = "Option<DateTime<Utc>>")]
pub enum Timestamp {
    Resolved(DateTime<Utc>),
    Pending,
}

impl Timestamp {
    pub fn resolved(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Resolved(t) => Some(*t),
            Timestamp::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Timestamp::Pending)
    }
}

impl From<Option<DateTime<Utc>>> for Timestamp {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map(Timestamp::Resolved).unwrap_or(Timestamp::Pending)
    }
}

impl From<Timestamp> for Option<DateTime<Utc>> {
    fn from(value: Timestamp) -> Self {
        value.resolved()
    }
}

/// A chat message as held by the document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub username: String,
    #[serde(default = "pending")]
    pub created_at: Timestamp,
}

fn pending() -> Timestamp {
    Timestamp::Pending
}

/// Record handed to the store on send; the store assigns `id` and resolves `created_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub text: String,
    pub username: String,
    pub created_at: Timestamp,
}

impl NewMessage {
    pub fn new(text: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            username: username.into(),
            created_at: Timestamp::Pending,
        }
    }

    /// Turn the draft into a stored message using the store's clock
    pub fn commit(self, now: DateTime<Utc>) -> Message {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            text: self.text,
            username: self.username,
            created_at: match self.created_at {
                Timestamp::Pending => Timestamp::Resolved(now),
                resolved => resolved,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_commit_resolves_pending_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 0).unwrap();
        let draft = NewMessage::new("hi", "Alice");
        assert!(draft.created_at.is_pending());

        let msg = draft.commit(now);
        assert_eq!(msg.created_at, Timestamp::Resolved(now));
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.username, "Alice");
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn test_pending_sorts_after_resolved() {
        let t = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert!(Timestamp::Resolved(t) < Timestamp::Pending);
    }

    #[test]
    fn test_missing_fields_deserialize_as_defaults() {
        let msg: Message = serde_json::from_str(r#"{"id":"x","createdAt":null}"#).unwrap();
        assert_eq!(msg.text, "");
        assert_eq!(msg.username, "");
        assert!(msg.created_at.is_pending());

        let msg: Message = serde_json::from_str(
            r#"{"id":"y","text":"yo","username":"Bob","createdAt":"2026-10-16T14:05:00Z"}"#,
        )
        .unwrap();
        assert_eq!(msg.created_at.resolved().unwrap().to_rfc3339(), "2026-10-16T14:05:00+00:00");
    }
}
