//! Transport for IMAP connections.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::config::{ImapConfig, Security};
use crate::error::ConnectError;

/// A stream that can be either plaintext or TLS.
#[derive(Debug)]
pub enum ImapStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl ImapStream {
    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Creates a TLS connector trusting the webpki root set.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

async fn open(config: &ImapConfig) -> Result<ImapStream, ConnectError> {
    let tcp = TcpStream::connect((config.host.as_str(), config.port)).await?;
    match config.security {
        Security::None => Ok(ImapStream::Plain(tcp)),
        Security::Tls => {
            let server_name = ServerName::try_from(config.host.clone())?;
            let tls = create_tls_connector().connect(server_name, tcp).await?;
            Ok(ImapStream::Tls(Box::new(tls)))
        }
        Security::StartTls => Err(ConnectError::Unsupported("STARTTLS")),
    }
}

/// Opens the transport described by `config`.
///
/// Each attempt is bounded by the connect timeout; failed attempts are
/// retried with a linear backoff up to the configured attempt count.
///
/// # Errors
///
/// Returns [`ConnectError::Unsupported`] for STARTTLS without trying, or the
/// last attempt's error.
pub async fn connect(config: &ImapConfig) -> Result<ImapStream, ConnectError> {
    if config.security == Security::StartTls {
        return Err(ConnectError::Unsupported("STARTTLS"));
    }

    let attempts = config.connect_attempts();
    let timeout = config.connect_timeout();

    for attempt in 1..=attempts {
        tracing::debug!(host = %config.host, port = config.port, attempt, "connecting");

        let err = match tokio::time::timeout(timeout, open(config)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => e,
            Err(_) => ConnectError::Timeout(timeout),
        };

        if attempt == attempts {
            return Err(err);
        }
        tracing::warn!(error = %err, attempt, "connection attempt failed");
        tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
    }

    Err(ConnectError::Timeout(timeout))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_starttls_is_rejected_without_connecting() {
        let config = ImapConfig::builder("imap.invalid")
            .security(Security::StartTls)
            .build();
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, ConnectError::Unsupported("STARTTLS")));
    }

    #[tokio::test]
    async fn test_plain_connect() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = ImapConfig::builder("127.0.0.1")
            .security(Security::None)
            .port(port)
            .build();

        let stream = connect(&config).await.unwrap();
        assert!(!stream.is_tls());
    }

    #[tokio::test]
    async fn test_refused_connect_gives_up_after_attempts() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ImapConfig::builder("127.0.0.1")
            .security(Security::None)
            .port(port)
            .connect_attempts(2)
            .build();
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, ConnectError::Io(_)));
    }
}
