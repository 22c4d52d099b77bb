//! [`MessageStore`] over IMAP.

use async_imap::types::Fetch;
use async_imap::{Client, Session};
use async_trait::async_trait;
use futures::TryStreamExt;
use phishscan_core::{
    Credentials, FetchError, MessageId, MessageStore, StoreError, StoreResult, StoreSession,
};

use crate::config::ImapConfig;
use crate::error::{fetch_error, is_fatal};
use crate::stream::{ImapStream, connect};

/// Fetch item for the full message that leaves `\Seen` untouched.
const FETCH_FULL_PEEK: &str = "BODY.PEEK[]";

/// Normalizes a mailbox name. `INBOX` is case-insensitive (RFC 3501 §5.1).
#[must_use]
pub fn normalize_mailbox(name: &str) -> String {
    let name = name.trim();
    if name.eq_ignore_ascii_case("inbox") {
        "INBOX".to_string()
    } else {
        name.to_string()
    }
}

/// IMAP server reachable with a fixed [`ImapConfig`].
#[derive(Debug, Clone)]
pub struct ImapStore {
    config: ImapConfig,
}

impl ImapStore {
    /// Create a store.
    #[must_use]
    pub const fn new(config: ImapConfig) -> Self {
        Self { config }
    }

    /// Server settings.
    #[must_use]
    pub const fn config(&self) -> &ImapConfig {
        &self.config
    }
}

#[async_trait]
impl MessageStore for ImapStore {
    type Session = ImapSession;

    async fn authenticate(&self, credentials: &Credentials) -> StoreResult<ImapSession> {
        let stream = connect(&self.config).await?;
        let client = Client::new(stream);

        let session = client
            .login(credentials.username(), credentials.password())
            .await
            .map_err(|(e, _client)| {
                if is_fatal(&e) {
                    StoreError::Connection(e.to_string())
                } else {
                    StoreError::Authentication(e.to_string())
                }
            })?;

        tracing::info!(
            host = %self.config.host,
            security = self.config.security.display_name(),
            user = credentials.username(),
            "logged in"
        );
        Ok(ImapSession {
            session: Some(session),
            selected: None,
        })
    }
}

/// One logged-in IMAP connection.
///
/// The connection is dropped after [`StoreSession::close`] or once it is
/// known to be dead; later calls report [`StoreError::Closed`].
pub struct ImapSession {
    session: Option<Session<ImapStream>>,
    selected: Option<String>,
}

impl std::fmt::Debug for ImapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapSession")
            .field("open", &self.session.is_some())
            .field("selected", &self.selected)
            .finish()
    }
}

impl ImapSession {
    /// Mailbox currently selected, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    fn live(&mut self) -> StoreResult<&mut Session<ImapStream>> {
        self.session.as_mut().ok_or(StoreError::Closed)
    }

    /// Explain an empty FETCH answer.
    ///
    /// The client ends the response stream quietly on EOF, so a `NOOP` tells
    /// an expunged message apart from a dead connection.
    async fn missing(&mut self, id: &MessageId) -> FetchError {
        let Some(session) = self.session.as_mut() else {
            return FetchError::ConnectionLost("session is closed".into());
        };
        match session.noop().await {
            Ok(()) => FetchError::NotFound(id.clone()),
            Err(e) => {
                let err = fetch_error(&e);
                if err.is_connection_lost() {
                    self.session = None;
                }
                err
            }
        }
    }
}

async fn fetch_uid(session: &mut Session<ImapStream>, uid: u32) -> Result<Vec<Fetch>, FetchError> {
    session
        .uid_fetch(uid.to_string(), FETCH_FULL_PEEK)
        .await
        .map_err(|e| fetch_error(&e))?
        .try_collect()
        .await
        .map_err(|e| fetch_error(&e))
}

#[async_trait]
impl StoreSession for ImapSession {
    async fn select_folder(&mut self, name: &str) -> StoreResult<()> {
        let folder = normalize_mailbox(name);
        let mailbox = self.live()?.select(&folder).await.map_err(|e| {
            StoreError::MailboxUnavailable {
                folder: folder.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(folder = %folder, exists = mailbox.exists, "selected mailbox");
        self.selected = Some(folder);
        Ok(())
    }

    async fn list_message_ids(&mut self) -> StoreResult<Vec<MessageId>> {
        if self.selected.is_none() {
            return Err(StoreError::NoFolderSelected);
        }

        let uids = self
            .live()?
            .uid_search("ALL")
            .await
            .map_err(|e| StoreError::Listing(e.to_string()))?;

        // The client hands back a set; ascending UID is this store's order.
        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();
        tracing::debug!(count = uids.len(), "UID SEARCH ALL");
        Ok(uids.into_iter().map(MessageId::from).collect())
    }

    async fn fetch_raw(&mut self, id: &MessageId) -> Result<Vec<u8>, FetchError> {
        let uid = id
            .as_number()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|&n| n > 0)
            .ok_or_else(|| FetchError::InvalidId(id.clone()))?;

        if self.selected.is_none() {
            return Err(FetchError::Transport("no mailbox selected".into()));
        }
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| FetchError::ConnectionLost("session is closed".into()))?;

        let fetches = match fetch_uid(session, uid).await {
            Ok(fetches) => fetches,
            Err(e) => {
                if e.is_connection_lost() {
                    self.session = None;
                }
                return Err(e);
            }
        };

        // Untagged FETCH data left over from an abandoned request can arrive
        // here too; only the item for the requested UID counts.
        if fetches.len() > 1 {
            tracing::debug!(uid, items = fetches.len(), "ignoring unrelated FETCH items");
        }
        let Some(fetch) = fetches.iter().find(|f| f.uid == Some(uid)) else {
            return Err(self.missing(id).await);
        };

        fetch
            .body()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| FetchError::Malformed(format!("FETCH for UID {uid} carried no body")))
    }

    async fn close(&mut self) -> StoreResult<()> {
        self.selected = None;
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        session
            .logout()
            .await
            .map_err(|e| StoreError::Logout(e.to_string()))?;
        tracing::debug!("logged out");
        Ok(())
    }
}
