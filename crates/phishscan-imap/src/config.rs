//! IMAP connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// No encryption (port 143). Only for local testing.
    None,
    /// Plaintext upgraded with STARTTLS. Not supported by [`ImapStore`](crate::ImapStore).
    StartTls,
    /// TLS from the start (port 993).
    #[default]
    Tls,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 143,
            Self::Tls => 993,
        }
    }

    /// Display name for the security mode.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::StartTls => "STARTTLS",
            Self::Tls => "SSL/TLS",
        }
    }
}

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_connect_attempts() -> u32 {
    DEFAULT_CONNECT_ATTEMPTS
}

/// IMAP server settings.
///
/// When deserialized without a `port`, the port follows `security`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ImapConfigFile")]
pub struct ImapConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Upper bound on TCP connect plus TLS handshake, in seconds.
    pub connect_timeout_secs: u64,
    /// How many times the connect step is tried before giving up.
    pub connect_attempts: u32,
}

/// Serialized form of [`ImapConfig`], with optional fields.
#[derive(Deserialize)]
struct ImapConfigFile {
    host: String,
    port: Option<u16>,
    #[serde(default)]
    security: Security,
    #[serde(default = "default_connect_timeout_secs")]
    connect_timeout_secs: u64,
    #[serde(default = "default_connect_attempts")]
    connect_attempts: u32,
}

impl From<ImapConfigFile> for ImapConfig {
    fn from(file: ImapConfigFile) -> Self {
        let mut builder = ImapConfigBuilder::new(file.host)
            .security(file.security)
            .connect_timeout(Duration::from_secs(file.connect_timeout_secs))
            .connect_attempts(file.connect_attempts);
        if let Some(port) = file.port {
            builder = builder.port(port);
        }
        builder.build()
    }
}

impl ImapConfig {
    /// Implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self::builder(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ImapConfigBuilder {
        ImapConfigBuilder::new(host)
    }

    /// Connect timeout as a [`Duration`], at least one second.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        if self.connect_timeout_secs == 0 {
            Duration::from_secs(1)
        } else {
            Duration::from_secs(self.connect_timeout_secs)
        }
    }

    /// Connect attempts, at least one.
    #[must_use]
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.max(1)
    }
}

/// Builder for [`ImapConfig`].
#[derive(Debug, Clone)]
pub struct ImapConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    connect_timeout_secs: u64,
    connect_attempts: u32,
}

impl ImapConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::Tls,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
        }
    }

    /// Sets the port. Defaults to the security mode's port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the number of connect attempts.
    #[must_use]
    pub const fn connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ImapConfig {
        ImapConfig {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            security: self.security,
            connect_timeout_secs: self.connect_timeout_secs,
            connect_attempts: self.connect_attempts,
        }
    }
}
