//! Domain types shared by the scanner, the stores and the classifiers.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::SkipReason;

/// Opaque, store-assigned message identifier.
///
/// Identifiers are unique within one session. Purely numeric identifiers
/// (IMAP UIDs) order numerically; anything else orders after them, by text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Create an identifier from its textual form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as a number, if it is one.
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<u32> for MessageId {
    fn from(uid: u32) -> Self {
        Self(uid.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for MessageId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for MessageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A fetched and decoded message. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Store identifier.
    pub id: MessageId,
    /// Decoded subject, if the message has one.
    pub subject: Option<String>,
    /// Decoded body text.
    pub body: String,
}

/// Login credentials for a message store.
///
/// The password never appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Login secret.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Verdict for one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Identifier of the classified message.
    pub id: MessageId,
    /// Subject of the classified message.
    pub subject: Option<String>,
    /// Whether the message looks like phishing.
    pub flagged: bool,
    /// Numeric score, when the classifier produces one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Diagnostic text explaining the verdict.
    pub reason: String,
}

/// A message left out of the results, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMessage {
    /// Identifier of the skipped message.
    pub id: MessageId,
    /// Why it was skipped.
    #[serde(serialize_with = "serialize_display")]
    pub reason: SkipReason,
}

/// Per-run counters.
///
/// `scanned` always equals `flagged + unflagged + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Messages enumerated and processed.
    pub scanned: usize,
    /// Messages classified as suspicious.
    pub flagged: usize,
    /// Messages classified as clean.
    pub unflagged: usize,
    /// Messages skipped after a per-message failure.
    pub skipped: usize,
}

impl ScanSummary {
    /// Checks the accounting invariant.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.scanned == self.flagged + self.unflagged + self.skipped
    }
}

/// Outcome of a completed scan run.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Folder that was scanned.
    pub folder: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Flagged messages, in enumeration order.
    pub flagged: Vec<ClassificationResult>,
    /// Skipped messages, in enumeration order.
    pub skipped: Vec<SkippedMessage>,
    /// Counters.
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Returns true if at least one message was flagged.
    #[must_use]
    pub const fn has_flagged(&self) -> bool {
        !self.flagged.is_empty()
    }

    /// Identifiers of the flagged messages.
    pub fn flagged_ids(&self) -> impl Iterator<Item = &MessageId> {
        self.flagged.iter().map(|r| &r.id)
    }
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_message_id_numeric_order() {
        let mut ids = vec![
            MessageId::new("10"),
            MessageId::new("9"),
            MessageId::new("abc"),
            MessageId::new("100"),
        ];
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(MessageId::as_str).collect();
        assert_eq!(ordered, ["9", "10", "100", "abc"]);
    }

    #[test]
    fn test_message_id_from_uid() {
        let id = MessageId::from(42u32);
        assert_eq!(id.as_str(), "42");
        assert_eq!(id.as_number(), Some(42));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice@example.com", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(creds.password(), "hunter2");
    }

    #[test]
    fn test_summary_consistency() {
        let summary = ScanSummary {
            scanned: 5,
            flagged: 2,
            unflagged: 2,
            skipped: 1,
        };
        assert!(summary.is_consistent());
        assert!(
            !ScanSummary {
                scanned: 4,
                ..summary
            }
            .is_consistent()
        );
    }

    #[test]
    fn test_skipped_message_serializes_reason_as_text() {
        let skipped = SkippedMessage {
            id: MessageId::new("3"),
            reason: SkipReason::Timeout(Duration::from_secs(30)),
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["id"], "3");
        assert_eq!(json["reason"], "fetch timed out after 30s");
    }
}
