//! Scripted message store for scanner tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use phishscan_core::{
    Credentials, FetchError, MessageId, MessageStore, StoreError, StoreResult, StoreSession,
};

/// What a fetch of one identifier does.
#[derive(Debug, Clone)]
pub enum Script {
    /// Return these raw bytes.
    Message(Vec<u8>),
    /// Fail with a recoverable transport error.
    Fail(String),
    /// Fail with a lost connection.
    Disconnect,
    /// Never complete.
    Hang,
}

/// A store whose behavior is fixed up front.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStore {
    pub reject_login: bool,
    pub missing_folder: bool,
    pub fail_listing: bool,
    pub fail_close: bool,
    /// Identifiers in the order the store lists them.
    pub listing: Vec<MessageId>,
    pub scripts: BTreeMap<MessageId, Script>,
    pub closes: Arc<AtomicUsize>,
    pub fetches: Arc<AtomicUsize>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message, listed after the ones already added.
    pub fn with(mut self, uid: u32, script: Script) -> Self {
        let id = MessageId::from(uid);
        self.listing.push(id.clone());
        self.scripts.insert(id, script);
        self
    }

    /// Add a well-formed message.
    pub fn with_message(self, uid: u32, subject: &str, body: &str) -> Self {
        let raw = format!("Subject: {subject}\r\nFrom: sender@example.com\r\n\r\n{body}\r\n");
        self.with(uid, Script::Message(raw.into_bytes()))
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

pub struct ScriptedSession {
    store: ScriptedStore,
    selected: bool,
}

#[async_trait]
impl MessageStore for ScriptedStore {
    type Session = ScriptedSession;

    async fn authenticate(&self, _credentials: &Credentials) -> StoreResult<ScriptedSession> {
        if self.reject_login {
            return Err(StoreError::Authentication("NO [AUTHENTICATIONFAILED]".into()));
        }
        Ok(ScriptedSession {
            store: self.clone(),
            selected: false,
        })
    }
}

#[async_trait]
impl StoreSession for ScriptedSession {
    async fn select_folder(&mut self, name: &str) -> StoreResult<()> {
        if self.store.missing_folder {
            return Err(StoreError::MailboxUnavailable {
                folder: name.to_string(),
                reason: "NO [NONEXISTENT] Unknown Mailbox".into(),
            });
        }
        self.selected = true;
        Ok(())
    }

    async fn list_message_ids(&mut self) -> StoreResult<Vec<MessageId>> {
        if !self.selected {
            return Err(StoreError::NoFolderSelected);
        }
        if self.store.fail_listing {
            return Err(StoreError::Listing("BAD search failed".into()));
        }
        Ok(self.store.listing.clone())
    }

    async fn fetch_raw(&mut self, id: &MessageId) -> Result<Vec<u8>, FetchError> {
        self.store.fetches.fetch_add(1, Ordering::SeqCst);
        match self.store.scripts.get(id).cloned() {
            Some(Script::Message(raw)) => Ok(raw),
            Some(Script::Fail(reason)) => Err(FetchError::Transport(reason)),
            Some(Script::Disconnect) => Err(FetchError::ConnectionLost("EOF".into())),
            Some(Script::Hang) => std::future::pending().await,
            None => Err(FetchError::NotFound(id.clone())),
        }
    }

    async fn close(&mut self) -> StoreResult<()> {
        self.store.closes.fetch_add(1, Ordering::SeqCst);
        if self.store.fail_close {
            return Err(StoreError::Logout("BYE".into()));
        }
        Ok(())
    }
}
