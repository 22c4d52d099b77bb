//! Message store seam.
//!
//! A [`MessageStore`] hands out authenticated [`StoreSession`]s. The scanner
//! only ever talks to these two traits, so any mailbox backend (IMAP, a local
//! maildir, a test double) can be scanned without changing the loop.

use async_trait::async_trait;

use crate::error::{FetchError, StoreResult};
use crate::model::{Credentials, MessageId};

/// A remote or local mailbox that can be logged into.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Session type produced by a successful login.
    type Session: StoreSession;

    /// Connect and log in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`](crate::StoreError::Connection) if the
    /// store cannot be reached and
    /// [`StoreError::Authentication`](crate::StoreError::Authentication) if the
    /// credentials are rejected.
    async fn authenticate(&self, credentials: &Credentials) -> StoreResult<Self::Session>;
}

/// One authenticated connection to a message store.
///
/// A session is owned by a single scan run and must not be shared.
#[async_trait]
pub trait StoreSession: Send {
    /// Open a folder for reading.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MailboxUnavailable`](crate::StoreError::MailboxUnavailable)
    /// if the folder cannot be opened.
    async fn select_folder(&mut self, name: &str) -> StoreResult<()>;

    /// List every message identifier in the selected folder.
    ///
    /// Ordering is store-defined and the scanner keeps it. The listing is
    /// collected eagerly, as IMAP returns it in one `SEARCH` response;
    /// messages are still fetched one at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails or no folder is selected.
    async fn list_message_ids(&mut self) -> StoreResult<Vec<MessageId>>;

    /// Fetch the raw RFC 5322 bytes of one message.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing why the message could not be read.
    async fn fetch_raw(&mut self, id: &MessageId) -> Result<Vec<u8>, FetchError>;

    /// Log out and release the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout exchange fails; the connection is
    /// released either way.
    async fn close(&mut self) -> StoreResult<()>;
}
