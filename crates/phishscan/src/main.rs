//! `phishscan` - scan an IMAP mailbox for phishing messages.
//!
//! Connects, walks one folder, classifies every message and prints a report.
//! Exit status: 0 on a completed scan, 1 with `--fail-on-flagged` when
//! something was flagged, 2 when the scan could not run.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod credentials;
mod report;
mod settings;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use phishscan_core::{Credentials, InboxScanner};
use phishscan_imap::ImapStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{AccountArgs, Cli, Command, ScanArgs};
use settings::Settings;

const DEFAULT_LOG_FILTER: &str = "phishscan=info,phishscan_core=info,phishscan_imap=info";
const VERBOSE_LOG_FILTER: &str = "phishscan=debug,phishscan_core=debug,phishscan_imap=debug";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr so the report on stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let path = cli.config.unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&path).await?;

    match cli.command {
        Command::Scan(args) => scan(settings, &args).await,
        Command::StorePassword(args) => {
            settings.apply_account(&args);
            store_password(&settings).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::ForgetPassword(args) => forget_password(settings, &args),
    }
}

async fn scan(mut settings: Settings, args: &ScanArgs) -> anyhow::Result<ExitCode> {
    settings.apply_scan(args);

    let imap = settings.imap_config()?;
    let username = settings.username()?;
    let password = credentials::resolve_password(
        username,
        &imap.host,
        std::env::var(credentials::PASSWORD_ENV).ok(),
    )?;
    let credentials = Credentials::new(username, password);

    let classifier = settings
        .scan
        .build_classifier()
        .context("Failed to build classifier")?;
    debug!(members = classifier.len(), "classifier ready");

    info!(
        host = %imap.host,
        port = imap.port,
        security = imap.security.display_name(),
        "connecting"
    );
    let store = ImapStore::new(imap);
    let scanner = InboxScanner::new(settings.scan.clone());

    let report = scanner
        .scan(&store, &credentials, &classifier)
        .await
        .map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("Scan aborted at {stage}"))
        })?;

    let mut stdout = std::io::stdout().lock();
    report::render(&report, args.format, &mut stdout).context("Failed to write report")?;
    stdout.flush().context("Failed to write report")?;

    if args.fail_on_flagged && report.has_flagged() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

async fn store_password(settings: &Settings) -> anyhow::Result<()> {
    let host = settings.host()?;
    let username = settings.username()?;

    eprintln!("Password for {username} on {host}:");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("No password given");
    }

    credentials::store_password(username, host, password)?;
    info!(username, host, "password saved to keyring");
    Ok(())
}

fn forget_password(mut settings: Settings, args: &AccountArgs) -> anyhow::Result<ExitCode> {
    settings.apply_account(args);
    let host = settings.host()?;
    let username = settings.username()?;

    if credentials::delete_password(username, host)? {
        info!(username, host, "password removed from keyring");
    } else {
        info!(username, host, "no password stored");
    }
    Ok(ExitCode::SUCCESS)
}
