//! Message classifiers.
//!
//! A [`Classifier`] maps a subject and a decoded body to a [`Verdict`]. The
//! default phishing heuristic is a [`HybridClassifier`] that ORs a
//! [`KeywordClassifier`] with a [`SentimentClassifier`]: either signal alone
//! flags the message. This favors recall over precision, so mail that is
//! merely negative in tone will be flagged too.

mod hybrid;
mod keyword;
mod sentiment;

pub use hybrid::HybridClassifier;
pub use keyword::{DEFAULT_KEYWORDS, KeywordClassifier};
pub use sentiment::{Lexicon, LexiconError, PolarityAnalyzer, SentimentClassifier};

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::ClassifierError;

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Whether the message looks suspicious.
    pub flagged: bool,
    /// Diagnostic text.
    pub reason: String,
    /// Numeric score, if the classifier produces one.
    pub score: Option<f64>,
}

impl Verdict {
    /// A positive verdict.
    #[must_use]
    pub fn flagged(reason: impl Into<String>) -> Self {
        Self {
            flagged: true,
            reason: reason.into(),
            score: None,
        }
    }

    /// A negative verdict.
    #[must_use]
    pub fn clean(reason: impl Into<String>) -> Self {
        Self {
            flagged: false,
            reason: reason.into(),
            score: None,
        }
    }

    /// Attach a score.
    #[must_use]
    pub const fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }
}

/// Pluggable message classifier.
///
/// Implementations must be pure: the same input always yields the same
/// verdict.
pub trait Classifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Classify a message.
    ///
    /// # Errors
    ///
    /// Returns a [`ClassifierError`] if the message cannot be scored. The
    /// scanner skips such messages.
    fn classify(&self, subject: Option<&str>, body: &str) -> Result<Verdict, ClassifierError>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn classify(&self, subject: Option<&str>, body: &str) -> Result<Verdict, ClassifierError> {
        (**self).classify(subject, body)
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn classify(&self, subject: Option<&str>, body: &str) -> Result<Verdict, ClassifierError> {
        (**self).classify(subject, body)
    }
}

/// Subject and body joined into one string for text matching.
fn joined_text(subject: Option<&str>, body: &str) -> String {
    match subject {
        Some(subject) if !subject.is_empty() => format!("{subject}\n{body}"),
        _ => body.to_string(),
    }
}

/// Run a classifier, turning a panic into [`ClassifierError::Panicked`].
pub(crate) fn classify_guarded<C>(
    classifier: &C,
    subject: Option<&str>,
    body: &str,
) -> Result<Verdict, ClassifierError>
where
    C: Classifier + ?Sized,
{
    catch_unwind(AssertUnwindSafe(|| classifier.classify(subject, body)))
        .unwrap_or_else(|payload| Err(ClassifierError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
