//! Error types for the scanner core.

use std::time::Duration;

use thiserror::Error;

use crate::model::MessageId;

/// Errors reported by a [`MessageStore`](crate::MessageStore) or its session.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached (DNS, TCP, TLS).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The store rejected the supplied credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The requested folder does not exist or cannot be opened.
    #[error("Mailbox {folder:?} unavailable: {reason}")]
    MailboxUnavailable {
        /// Folder that was requested.
        folder: String,
        /// Reason given by the store.
        reason: String,
    },

    /// Message identifiers could not be listed.
    #[error("Listing messages failed: {0}")]
    Listing(String),

    /// An operation was attempted before a folder was selected.
    #[error("No folder selected")]
    NoFolderSelected,

    /// The session has already been closed.
    #[error("Session is closed")]
    Closed,

    /// Logging out of the store failed.
    #[error("Logout failed: {0}")]
    Logout(String),

    /// The store configuration asks for something this store cannot do.
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),
}

/// Errors fetching a single message.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The store returned no data for the identifier.
    #[error("Message {0} not found")]
    NotFound(MessageId),

    /// The identifier is not valid for this store.
    #[error("Invalid message identifier {0:?}")]
    InvalidId(MessageId),

    /// The store answered, but the message could not be extracted.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The request failed in transit; later requests may still succeed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The connection to the store is gone; no later request can succeed.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}

impl FetchError {
    /// Returns true if the session cannot serve any further request.
    #[must_use]
    pub const fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}

/// Errors produced by a [`Classifier`](crate::Classifier).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    /// The classifier produced a score outside its declared range.
    #[error("Score {score} outside [{min}, {max}]")]
    ScoreOutOfRange {
        /// Offending score.
        score: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// The classifier panicked while scoring the message.
    #[error("Classifier panicked: {0}")]
    Panicked(String),

    /// The classifier has no members to consult.
    #[error("Classifier has no members")]
    Empty,

    /// Any other classifier failure.
    #[error("Classifier failed: {0}")]
    Failed(String),
}

/// Stage of a scan run at which a fatal error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    /// Connecting and logging in.
    Authenticate,
    /// Opening the configured folder.
    SelectFolder,
    /// Listing message identifiers.
    Enumerate,
    /// Fetching messages.
    Fetch,
}

impl ScanStage {
    /// Short name for logs and reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::SelectFolder => "select-folder",
            Self::Enumerate => "enumerate",
            Self::Fetch => "fetch",
        }
    }
}

impl std::fmt::Display for ScanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors that abort a scan run.
///
/// Per-message failures never show up here; they are counted as skips in the
/// [`ScanReport`](crate::ScanReport).
#[derive(Debug, Error)]
pub enum ScanError {
    /// Connecting or logging in failed.
    #[error("Authentication failed")]
    Authentication(#[source] StoreError),

    /// The configured folder could not be selected.
    #[error("Mailbox {folder:?} unavailable")]
    MailboxUnavailable {
        /// Folder that was requested.
        folder: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// Listing the folder's messages failed.
    #[error("Enumerating messages failed")]
    Enumeration(#[source] StoreError),

    /// The store connection dropped mid-run.
    #[error("Connection lost after {processed} of {total} messages")]
    ConnectionLost {
        /// Messages handled before the connection dropped.
        processed: usize,
        /// Messages enumerated for the run.
        total: usize,
        /// Underlying fetch error.
        #[source]
        source: FetchError,
    },
}

impl ScanError {
    /// The stage at which the run was aborted.
    #[must_use]
    pub const fn stage(&self) -> ScanStage {
        match self {
            Self::Authentication(_) => ScanStage::Authenticate,
            Self::MailboxUnavailable { .. } => ScanStage::SelectFolder,
            Self::Enumeration(_) => ScanStage::Enumerate,
            Self::ConnectionLost { .. } => ScanStage::Fetch,
        }
    }
}

/// Reason a single message was left out of the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The fetch failed.
    Fetch(String),
    /// The fetch did not complete in time.
    Timeout(Duration),
    /// The classifier failed on the message.
    Classifier(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {e}"),
            Self::Timeout(d) => write!(f, "fetch timed out after {}s", d.as_secs_f64()),
            Self::Classifier(e) => write!(f, "classifier failed: {e}"),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
