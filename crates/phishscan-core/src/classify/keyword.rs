//! Lexical keyword matching.

use super::{Classifier, Verdict, joined_text};
use crate::error::ClassifierError;

/// Keywords flagged when no other list is configured.
pub const DEFAULT_KEYWORDS: &[&str] = &["urgent", "click here"];

/// Flags a message if its subject or body contains any keyword,
/// ignoring case.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    /// Create a classifier from a keyword list.
    ///
    /// Keywords are trimmed and lowercased; blanks and duplicates are dropped.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Self {
            keywords: normalized,
        }
    }

    /// The normalized keyword list.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First keyword found in the text, in configured order.
    fn first_match(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| haystack.contains(k.as_str()))
            .map(String::as_str)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl Classifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    fn classify(&self, subject: Option<&str>, body: &str) -> Result<Verdict, ClassifierError> {
        let text = joined_text(subject, body);
        Ok(self.first_match(&text).map_or_else(
            || Verdict::clean("no keyword match"),
            |keyword| Verdict::flagged(format!("matched keyword {keyword:?}")),
        ))
    }
}
