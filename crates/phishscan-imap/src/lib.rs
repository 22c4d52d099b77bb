//! # phishscan-imap
//!
//! IMAP backend for `phishscan-core`.
//!
//! Wire handling is done by `async-imap`; this crate supplies the transport
//! (implicit TLS through rustls with the webpki roots, or plaintext for local
//! testing) and maps the client onto the [`MessageStore`] seam:
//!
//! - `LOGIN` with the caller's credentials, never retried
//! - `SELECT` with `inbox` normalized to `INBOX`
//! - `UID SEARCH ALL`, listed in ascending UID order
//! - `UID FETCH <uid> BODY.PEEK[]`, which does not set `\Seen`
//! - `LOGOUT` on close
//!
//! ```ignore
//! use phishscan_imap::{ImapConfig, ImapStore};
//!
//! let store = ImapStore::new(ImapConfig::new("imap.example.com"));
//! let report = scanner.scan(&store, &credentials, &classifier).await?;
//! ```
//!
//! [`MessageStore`]: phishscan_core::MessageStore

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod store;
mod stream;

pub use config::{ImapConfig, ImapConfigBuilder, Security};
pub use error::ConnectError;
pub use store::{ImapSession, ImapStore, normalize_mailbox};
pub use stream::{ImapStream, connect, create_tls_connector};
