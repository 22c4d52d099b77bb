//! The scan loop: authenticate, select, enumerate, fetch, classify, report.
//!
//! Processing is strictly sequential over one session. Per-message failures
//! (fetch error, fetch timeout, classifier error or panic) become skips; only
//! store-level failures abort the run.
//!
//! A fetch that times out is abandoned mid-request. Stores whose protocol is
//! stateful (IMAP) may then see the late response on the next request; such a
//! store must match responses to the requested identifier, or report the
//! session as [`FetchError::ConnectionLost`] so the run stops.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::classify::{Classifier, classify_guarded};
use crate::config::ScanConfig;
use crate::decode::decode_message;
use crate::error::{FetchError, ScanError, SkipReason};
use crate::model::{
    ClassificationResult, Credentials, MessageId, ScanReport, ScanSummary, SkippedMessage,
};
use crate::store::{MessageStore, StoreSession};

/// Runs scans with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct InboxScanner {
    config: ScanConfig,
}

/// Outcome for one message.
enum Outcome {
    Classified(ClassificationResult),
    Skipped(SkipReason),
    ConnectionLost(FetchError),
}

/// Results gathered while walking the folder.
#[derive(Default)]
struct Tally {
    flagged: Vec<ClassificationResult>,
    skipped: Vec<SkippedMessage>,
    summary: ScanSummary,
}

impl InboxScanner {
    /// Create a scanner.
    #[must_use]
    pub const fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// The scan settings.
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the configured folder once.
    ///
    /// The session is closed exactly once after a successful login, whatever
    /// the outcome. A failing close is logged and does not change the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if login, folder selection or enumeration
    /// fails, or if the connection is lost while fetching.
    pub async fn scan<S, C>(
        &self,
        store: &S,
        credentials: &Credentials,
        classifier: &C,
    ) -> Result<ScanReport, ScanError>
    where
        S: MessageStore,
        C: Classifier + ?Sized,
    {
        let started_at = Utc::now();
        info!(folder = %self.config.folder, user = credentials.username(), "starting scan");

        let mut session = store
            .authenticate(credentials)
            .await
            .map_err(ScanError::Authentication)?;

        let outcome = self.walk(&mut session, classifier).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "closing session failed");
        }

        let tally = outcome?;
        let report = ScanReport {
            folder: self.config.folder.clone(),
            started_at,
            finished_at: Utc::now(),
            flagged: tally.flagged,
            skipped: tally.skipped,
            summary: tally.summary,
        };

        info!(
            scanned = report.summary.scanned,
            flagged = report.summary.flagged,
            skipped = report.summary.skipped,
            "scan complete"
        );
        Ok(report)
    }

    async fn walk<T, C>(&self, session: &mut T, classifier: &C) -> Result<Tally, ScanError>
    where
        T: StoreSession,
        C: Classifier + ?Sized,
    {
        let folder = self.config.folder.as_str();
        session
            .select_folder(folder)
            .await
            .map_err(|source| ScanError::MailboxUnavailable {
                folder: folder.to_string(),
                source,
            })?;

        let mut ids = session
            .list_message_ids()
            .await
            .map_err(ScanError::Enumeration)?;
        let mut seen = HashSet::with_capacity(ids.len());
        ids.retain(|id| seen.insert(id.clone()));

        let total = ids.len();
        info!(folder, total, "enumerated messages");

        let timeout = self.config.fetch_timeout();
        let mut tally = Tally::default();

        for (processed, id) in ids.into_iter().enumerate() {
            match process(session, classifier, &id, timeout).await {
                Outcome::Classified(result) => {
                    tally.summary.scanned += 1;
                    if result.flagged {
                        info!(%id, reason = %result.reason, "flagged");
                        tally.summary.flagged += 1;
                        tally.flagged.push(result);
                    } else {
                        debug!(%id, reason = %result.reason, "clean");
                        tally.summary.unflagged += 1;
                    }
                }
                Outcome::Skipped(reason) => {
                    warn!(%id, %reason, "skipping message");
                    tally.summary.scanned += 1;
                    tally.summary.skipped += 1;
                    tally.skipped.push(SkippedMessage { id, reason });
                }
                Outcome::ConnectionLost(source) => {
                    warn!(%id, error = %source, processed, total, "connection lost");
                    return Err(ScanError::ConnectionLost {
                        processed,
                        total,
                        source,
                    });
                }
            }
        }

        Ok(tally)
    }
}

async fn process<T, C>(
    session: &mut T,
    classifier: &C,
    id: &MessageId,
    timeout: Duration,
) -> Outcome
where
    T: StoreSession,
    C: Classifier + ?Sized,
{
    let raw = match tokio::time::timeout(timeout, session.fetch_raw(id)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) if e.is_connection_lost() => return Outcome::ConnectionLost(e),
        Ok(Err(e)) => return Outcome::Skipped(SkipReason::Fetch(e.to_string())),
        Err(_) => return Outcome::Skipped(SkipReason::Timeout(timeout)),
    };

    let message = decode_message(id.clone(), &raw);
    debug!(%id, bytes = raw.len(), subject = ?message.subject, "fetched");

    match classify_guarded(classifier, message.subject.as_deref(), &message.body) {
        Ok(verdict) => Outcome::Classified(ClassificationResult {
            id: message.id,
            subject: message.subject,
            flagged: verdict.flagged,
            score: verdict.score,
            reason: verdict.reason,
        }),
        Err(e) => Outcome::Skipped(SkipReason::Classifier(e.to_string())),
    }
}
