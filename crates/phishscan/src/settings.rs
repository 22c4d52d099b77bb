//! Settings file and command line overrides.
//!
//! Precedence, highest first: command line, environment (through clap's
//! `env` support), settings file, built-in defaults.

use std::path::{Path, PathBuf};

use phishscan_core::ScanConfig;
use phishscan_imap::{ImapConfig, Security};
use serde::{Deserialize, Serialize};

use crate::cli::{AccountArgs, ScanArgs};

/// Errors loading or completing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        /// Settings file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Settings`].
    #[error("Invalid settings in {}: {source}", path.display())]
    Parse {
        /// Settings file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A required value was given nowhere.
    #[error("No {0} configured; pass --{0} or set it in the settings file")]
    Missing(&'static str),
}

/// Contents of `settings.json`. Passwords are never stored here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IMAP server hostname.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// IMAP server port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Connection security.
    pub security: Security,
    /// Login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Upper bound on connect plus handshake, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,
    /// Connect attempts before giving up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_attempts: Option<u32>,
    /// Scan settings.
    pub scan: ScanConfig,
}

impl Settings {
    /// `<config dir>/phishscan/settings.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("phishscan")
            .join("settings.json")
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let settings = serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Overlay account arguments.
    pub fn apply_account(&mut self, args: &AccountArgs) {
        if let Some(host) = &args.host {
            self.host = Some(host.clone());
        }
        if let Some(username) = &args.username {
            self.username = Some(username.clone());
        }
    }

    /// Overlay scan arguments.
    pub fn apply_scan(&mut self, args: &ScanArgs) {
        self.apply_account(&args.account);
        if let Some(port) = args.port {
            self.port = Some(port);
        }
        if let Some(security) = args.security {
            self.security = security.into();
        }
        if let Some(folder) = &args.folder {
            self.scan.folder.clone_from(folder);
        }
        if let Some(timeout) = args.timeout {
            self.scan.fetch_timeout_secs = timeout;
        }
        if !args.keywords.is_empty() {
            self.scan.keywords.clone_from(&args.keywords);
        }
        if let Some(threshold) = args.threshold {
            self.scan.sentiment_threshold = threshold;
        }
        if let Some(lexicon) = &args.lexicon {
            self.scan.lexicon_path = Some(lexicon.clone());
        }
    }

    /// Hostname, which has no default.
    pub fn host(&self) -> Result<&str, SettingsError> {
        self.host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or(SettingsError::Missing("host"))
    }

    /// Login name, which has no default.
    pub fn username(&self) -> Result<&str, SettingsError> {
        self.username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(SettingsError::Missing("username"))
    }

    /// Connection settings for the IMAP store.
    pub fn imap_config(&self) -> Result<ImapConfig, SettingsError> {
        let mut builder = ImapConfig::builder(self.host()?).security(self.security);
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(std::time::Duration::from_secs(secs));
        }
        if let Some(attempts) = self.connect_attempts {
            builder = builder.connect_attempts(attempts);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Command};

    fn scan_args(args: &[&str]) -> ScanArgs {
        let argv = ["phishscan", "scan"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Scan(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    const FILE: &str = r#"{
        "host": "imap.example.com",
        "username": "alice@example.com",
        "connect_attempts": 5,
        "scan": { "folder": "Junk", "keywords": ["gift card"], "sentiment_threshold": -0.2 }
    }"#;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("phishscan-does-not-exist").join("settings.json");
        let settings = Settings::load(&path).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.scan.folder, "INBOX");
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = std::env::temp_dir().join(format!("phishscan-settings-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("settings.json");
        tokio::fs::write(&path, FILE).await.unwrap();

        let settings = Settings::load(&path).await.unwrap();
        assert_eq!(settings.host().unwrap(), "imap.example.com");
        assert_eq!(settings.scan.folder, "Junk");
        assert_eq!(settings.scan.fetch_timeout_secs, 30);

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("phishscan-bad-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("settings.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = Settings::load(&path).await.unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let mut settings: Settings = serde_json::from_str(FILE).unwrap();
        settings.apply_scan(&scan_args(&[
            "--host",
            "imap.other.net",
            "--folder",
            "inbox",
            "-k",
            "verify",
            "--security",
            "none",
        ]));

        assert_eq!(settings.host().unwrap(), "imap.other.net");
        assert_eq!(settings.username().unwrap(), "alice@example.com");
        assert_eq!(settings.scan.folder, "inbox");
        assert_eq!(settings.scan.keywords, ["verify"]);
        assert_eq!(settings.scan.sentiment_threshold, -0.2);

        let imap = settings.imap_config().unwrap();
        assert_eq!(imap.host, "imap.other.net");
        assert_eq!(imap.security, Security::None);
        assert_eq!(imap.port, 143);
        assert_eq!(imap.connect_attempts, 5);
    }

    #[test]
    fn test_missing_host() {
        let settings = Settings::default();
        assert!(matches!(settings.host(), Err(SettingsError::Missing("host"))));
        assert!(matches!(
            settings.username(),
            Err(SettingsError::Missing("username"))
        ));
        assert!(settings.imap_config().is_err());
    }

    #[test]
    fn test_no_password_field() {
        let settings: Settings = serde_json::from_str(FILE).unwrap();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("password"));
    }
}
