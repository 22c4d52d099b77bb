//! Connection errors and mapping of client errors onto the core taxonomy.

use std::io;
use std::time::Duration;

use phishscan_core::{FetchError, StoreError};
use thiserror::Error;

/// Errors establishing the transport.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// I/O error during connect.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Connect did not finish in time.
    #[error("Connect timed out after {0:?}")]
    Timeout(Duration),

    /// The security mode is not supported.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl From<ConnectError> for StoreError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Unsupported(_) => Self::Unsupported(err.to_string()),
            other => Self::Connection(other.to_string()),
        }
    }
}

/// Returns true if the error means the connection cannot be used again.
pub fn is_fatal(err: &async_imap::error::Error) -> bool {
    use async_imap::error::Error;

    match err {
        Error::ConnectionLost => true,
        Error::Io(e) => matches!(
            e.kind(),
            io::ErrorKind::UnexpectedEof
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
        ),
        _ => false,
    }
}

/// Map a client error raised while fetching one message.
pub fn fetch_error(err: &async_imap::error::Error) -> FetchError {
    use async_imap::error::Error;

    if is_fatal(err) {
        return FetchError::ConnectionLost(err.to_string());
    }
    match err {
        Error::Parse(_) => FetchError::Malformed(err.to_string()),
        _ => FetchError::Transport(err.to_string()),
    }
}
