//! Password lookup: environment first, then the system keyring.
//!
//! Keyring entries live under the `phishscan` service with the account key
//! `<username>@<host>`:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::debug;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "phishscan";

/// Environment variable checked before the keyring.
pub const PASSWORD_ENV: &str = "PHISHSCAN_PASSWORD";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// No password anywhere.
    #[error(
        "No password for {0}; set {PASSWORD_ENV} or run `phishscan store-password`"
    )]
    NotFound(String),

    /// An empty password was supplied.
    #[error("Refusing to store an empty password")]
    EmptyPassword,
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

fn account_key(username: &str, host: &str) -> String {
    format!("{username}@{host}")
}

fn entry(username: &str, host: &str) -> CredentialResult<Entry> {
    Ok(Entry::new(SERVICE_NAME, &account_key(username, host))?)
}

/// Stores the password in the system keyring.
pub fn store_password(username: &str, host: &str, password: &str) -> CredentialResult<()> {
    if password.is_empty() {
        return Err(CredentialError::EmptyPassword);
    }
    entry(username, host)?.set_password(password)?;
    debug!(account = %account_key(username, host), "stored password");
    Ok(())
}

/// Retrieves the password from the system keyring.
pub fn get_password(username: &str, host: &str) -> CredentialResult<Option<String>> {
    match entry(username, host)?.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => {
            debug!(account = %account_key(username, host), "no password in keyring");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes the password from the system keyring.
///
/// Returns `false` if there was nothing to delete.
pub fn delete_password(username: &str, host: &str) -> CredentialResult<bool> {
    match entry(username, host)?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Resolves the login password.
///
/// `from_env` is the value of [`PASSWORD_ENV`], if set; a non-empty value wins
/// over the keyring.
pub fn resolve_password(
    username: &str,
    host: &str,
    from_env: Option<String>,
) -> CredentialResult<String> {
    if let Some(password) = from_env.filter(|p| !p.is_empty()) {
        debug!("using password from {PASSWORD_ENV}");
        return Ok(password);
    }
    get_password(username, host)?.ok_or_else(|| CredentialError::NotFound(account_key(username, host)))
}
