//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use phishscan_imap::Security;

/// Scan an IMAP mailbox for phishing messages.
#[derive(Debug, Parser)]
#[command(name = "phishscan", version, about = "Scan an IMAP mailbox for phishing messages")]
pub struct Cli {
    /// Settings file [default: <config dir>/phishscan/settings.json]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a folder once and print the flagged messages
    Scan(ScanArgs),
    /// Save the account password in the system keyring (read from stdin)
    StorePassword(AccountArgs),
    /// Remove the account password from the system keyring
    ForgetPassword(AccountArgs),
}

/// Which account to use.
#[derive(Debug, Clone, Default, Args)]
pub struct AccountArgs {
    /// IMAP server hostname
    #[arg(long, env = "PHISHSCAN_HOST")]
    pub host: Option<String>,

    /// Login name
    #[arg(short, long, env = "PHISHSCAN_USERNAME")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// IMAP server port [default: 993 for tls, 143 otherwise]
    #[arg(long, env = "PHISHSCAN_PORT")]
    pub port: Option<u16>,

    /// Connection security
    #[arg(long, value_enum)]
    pub security: Option<SecurityArg>,

    /// Folder to scan [default: INBOX]
    #[arg(long, env = "PHISHSCAN_FOLDER")]
    pub folder: Option<String>,

    /// Per-message fetch timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Keyword to flag; repeat to replace the default list
    #[arg(short, long = "keyword", value_name = "WORD")]
    pub keywords: Vec<String>,

    /// Polarity below which a message is flagged [default: 0.0]
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// JSON lexicon `{ "word": polarity }` replacing the built-in one
    #[arg(long, value_name = "PATH")]
    pub lexicon: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit with status 1 when any message is flagged
    #[arg(long)]
    pub fail_on_flagged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SecurityArg {
    /// Implicit TLS
    Tls,
    /// Plaintext, for local testing only
    None,
    /// STARTTLS (rejected)
    Starttls,
}

impl From<SecurityArg> for Security {
    fn from(arg: SecurityArg) -> Self {
        match arg {
            SecurityArg::Tls => Self::Tls,
            SecurityArg::None => Self::None,
            SecurityArg::Starttls => Self::StartTls,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// The full report as JSON
    Json,
}
