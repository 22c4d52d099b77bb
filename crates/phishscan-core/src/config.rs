//! Scan configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{
    DEFAULT_KEYWORDS, HybridClassifier, KeywordClassifier, Lexicon, LexiconError,
    SentimentClassifier,
};

/// Folder scanned when none is configured.
pub const DEFAULT_FOLDER: &str = "INBOX";

/// Per-message fetch timeout when none is configured.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

fn default_folder() -> String {
    DEFAULT_FOLDER.to_string()
}

const fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(ToString::to_string).collect()
}

/// Settings for one scan run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Folder to scan.
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Upper bound on a single message fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Keywords for the keyword classifier.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    /// Polarity below which the sentiment classifier flags a message.
    pub sentiment_threshold: f64,
    /// Optional JSON lexicon replacing the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexicon_path: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            keywords: default_keywords(),
            sentiment_threshold: 0.0,
            lexicon_path: None,
        }
    }
}

impl ScanConfig {
    /// Fetch timeout as a [`Duration`].
    ///
    /// A zero setting is raised to one second.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    /// Set the folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Set the fetch timeout.
    #[must_use]
    pub const fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    /// Build the keyword-OR-sentiment classifier these settings describe.
    ///
    /// # Errors
    ///
    /// Returns a [`LexiconError`] if `lexicon_path` is set and the file cannot
    /// be loaded.
    pub fn build_classifier(&self) -> Result<HybridClassifier, LexiconError> {
        let lexicon = match &self.lexicon_path {
            Some(path) => {
                let lexicon = Lexicon::load(path)?;
                tracing::debug!(path = %path.display(), words = lexicon.len(), "loaded lexicon");
                lexicon
            }
            None => Lexicon::default(),
        };

        Ok(HybridClassifier::new()
            .with(KeywordClassifier::new(&self.keywords))
            .with(SentimentClassifier::with_analyzer(
                lexicon,
                self.sentiment_threshold,
            )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::classify::Classifier;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.folder, "INBOX");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.keywords, ["urgent", "click here"]);
        assert!(config.lexicon_path.is_none());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{ "folder": "Junk", "keywords": ["verify"] }"#).unwrap();
        assert_eq!(config.folder, "Junk");
        assert_eq!(config.keywords, ["verify"]);
        assert_eq!(config.fetch_timeout_secs, 30);
    }

    #[test]
    fn test_zero_timeout_is_raised() {
        let config = ScanConfig::default().with_fetch_timeout_secs(0);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_builds_configured_classifier() {
        let config = ScanConfig {
            keywords: vec!["Wire Transfer".into()],
            ..ScanConfig::default()
        };
        let classifier = config.build_classifier().unwrap();
        assert_eq!(classifier.len(), 2);

        let verdict = classifier
            .classify(Some("Thanks"), "please confirm the wire transfer")
            .unwrap();
        assert!(verdict.flagged);
        assert!(verdict.reason.contains("wire transfer"));
    }

    #[test]
    fn test_loads_custom_lexicon() {
        let dir = std::env::temp_dir().join(format!("phishscan-lexicon-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lexicon.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{ "invoice": -0.9 }"#).unwrap();

        let config = ScanConfig {
            keywords: Vec::new(),
            lexicon_path: Some(path),
            ..ScanConfig::default()
        };
        let verdict = config
            .build_classifier()
            .unwrap()
            .classify(None, "invoice attached")
            .unwrap();
        assert!(verdict.flagged);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_missing_lexicon_is_an_error() {
        let config = ScanConfig {
            lexicon_path: Some(PathBuf::from("/nonexistent/phishscan/lexicon.json")),
            ..ScanConfig::default()
        };
        assert!(matches!(config.build_classifier(), Err(LexiconError::Io(_))));
    }
}
