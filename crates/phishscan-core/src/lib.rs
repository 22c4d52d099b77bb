//! # phishscan-core
//!
//! Inbox threat-classification loop.
//!
//! This crate provides:
//! - The [`MessageStore`] / [`StoreSession`] seam over any mailbox backend
//! - Pluggable [`Classifier`]s (keyword, lexicon sentiment, OR-hybrid)
//! - Lenient RFC 5322 / MIME decoding that never fails
//! - The [`InboxScanner`] loop producing a [`ScanReport`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use phishscan_core::{Credentials, InboxScanner, ScanConfig};
//!
//! let config = ScanConfig::default();
//! let classifier = config.build_classifier()?;
//! let scanner = InboxScanner::new(config);
//! let report = scanner
//!     .scan(&store, &Credentials::new("user", password), &classifier)
//!     .await?;
//! for result in &report.flagged {
//!     println!("{} {}", result.id, result.reason);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod classify;
mod config;
pub mod decode;
mod error;
mod model;
mod scanner;
mod store;

pub use classify::{
    Classifier, DEFAULT_KEYWORDS, HybridClassifier, KeywordClassifier, Lexicon, LexiconError,
    PolarityAnalyzer, SentimentClassifier, Verdict,
};
pub use config::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_FOLDER, ScanConfig};
pub use decode::decode_message;
pub use error::{
    ClassifierError, FetchError, ScanError, ScanStage, SkipReason, StoreError, StoreResult,
};
pub use model::{
    ClassificationResult, Credentials, Message, MessageId, ScanReport, ScanSummary,
    SkippedMessage,
};
pub use scanner::InboxScanner;
pub use store::{MessageStore, StoreSession};
