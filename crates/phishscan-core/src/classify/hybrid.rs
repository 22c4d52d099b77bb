//! OR-combination of classifiers.

use super::{Classifier, KeywordClassifier, SentimentClassifier, Verdict, classify_guarded};
use crate::error::ClassifierError;

/// Flags a message if any member flags it.
///
/// A member error or panic does not hide a positive signal from another
/// member; the error is only returned when no member flagged the message.
#[derive(Default)]
pub struct HybridClassifier {
    members: Vec<Box<dyn Classifier>>,
}

impl HybridClassifier {
    /// Empty combination. Add members with [`Self::with`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyword matching OR negative sentiment, with built-in settings.
    #[must_use]
    pub fn phishing() -> Self {
        Self::new()
            .with(KeywordClassifier::default())
            .with(SentimentClassifier::default())
    }

    /// Add a member.
    #[must_use]
    pub fn with(mut self, member: impl Classifier + 'static) -> Self {
        self.members.push(Box::new(member));
        self
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl std::fmt::Debug for HybridClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.members.iter().map(|m| m.name()).collect();
        f.debug_struct("HybridClassifier")
            .field("members", &names)
            .finish()
    }
}

impl Classifier for HybridClassifier {
    fn name(&self) -> &str {
        "hybrid"
    }

    fn classify(&self, subject: Option<&str>, body: &str) -> Result<Verdict, ClassifierError> {
        if self.members.is_empty() {
            return Err(ClassifierError::Empty);
        }

        let mut hits = Vec::new();
        let mut notes = Vec::new();
        let mut score = None;
        let mut first_error = None;

        for member in &self.members {
            match classify_guarded(member, subject, body) {
                Ok(verdict) => {
                    score = score.or(verdict.score);
                    if verdict.flagged {
                        hits.push(format!("{}: {}", member.name(), verdict.reason));
                    } else {
                        notes.push(format!("{}: {}", member.name(), verdict.reason));
                    }
                }
                Err(e) => {
                    tracing::debug!(classifier = member.name(), error = %e, "member failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        let verdict = if !hits.is_empty() {
            Verdict::flagged(hits.join("; "))
        } else if let Some(e) = first_error {
            return Err(e);
        } else {
            Verdict::clean(notes.join("; "))
        };

        Ok(Verdict { score, ..verdict })
    }
}
