//! Lexicon-based sentiment polarity.
//!
//! Polarity is the mean of the polarities of the scored words in a text,
//! in `[-1.0, 1.0]`. A negation word (`not`, `never`, `don't`, ...) scales
//! the next scored word by `-0.5`; an intensifier (`very`, `extremely`, ...)
//! multiplies it. Modifiers only reach the word right after them, but they
//! chain (`not very good`).

use std::collections::HashMap;
use std::path::Path;

use super::{Classifier, Verdict, joined_text};
use crate::error::ClassifierError;

/// Anything that can score the polarity of a text.
pub trait PolarityAnalyzer: Send + Sync {
    /// Polarity of the text, expected in `[-1.0, 1.0]`.
    fn polarity(&self, text: &str) -> f64;
}

/// Errors loading a custom lexicon.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    /// The lexicon file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The lexicon is not a JSON object of numbers.
    #[error("Invalid lexicon JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A word has a polarity outside `[-1.0, 1.0]`.
    #[error("Polarity {polarity} for {word:?} outside [-1, 1]")]
    OutOfRange {
        /// Offending word.
        word: String,
        /// Offending polarity.
        polarity: f64,
    },
}

/// Multiplier applied to a scored word following a negation.
const NEGATION_FACTOR: f64 = -0.5;

const NEGATIONS: &[&str] = &["not", "no", "never", "nor", "neither", "without"];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.2),
    ("so", 1.2),
    ("too", 1.2),
    ("extremely", 1.5),
    ("highly", 1.4),
    ("absolutely", 1.4),
    ("completely", 1.3),
    ("totally", 1.3),
    ("immediately", 1.3),
    ("most", 1.2),
    ("quite", 1.1),
    ("slightly", 0.6),
    ("somewhat", 0.7),
];

/// Built-in word polarities, tuned for mail.
const BUILTIN: &[(&str, f64)] = &[
    // positive
    ("thanks", 0.2),
    ("thank", 0.2),
    ("appreciate", 0.5),
    ("appreciated", 0.5),
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("wonderful", 1.0),
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("nice", 0.6),
    ("happy", 0.8),
    ("glad", 0.5),
    ("pleased", 0.5),
    ("love", 0.5),
    ("enjoy", 0.4),
    ("enjoyed", 0.4),
    ("welcome", 0.8),
    ("congratulations", 0.6),
    ("best", 1.0),
    ("better", 0.5),
    ("fine", 0.4),
    ("helpful", 0.5),
    ("kind", 0.6),
    ("perfect", 1.0),
    ("success", 0.3),
    ("successful", 0.75),
    ("successfully", 0.75),
    ("fantastic", 0.4),
    ("beautiful", 0.85),
    ("fun", 0.3),
    ("free", 0.4),
    ("safe", 0.5),
    ("secure", 0.4),
    ("easy", 0.43),
    ("exciting", 0.3),
    ("interesting", 0.5),
    ("useful", 0.3),
    ("valuable", 0.4),
    ("correct", 0.3),
    // negative
    ("bad", -0.7),
    ("terrible", -1.0),
    ("horrible", -1.0),
    ("awful", -1.0),
    ("poor", -0.4),
    ("wrong", -0.5),
    ("sorry", -0.5),
    ("unfortunately", -0.5),
    ("problem", -0.3),
    ("problems", -0.3),
    ("issue", -0.2),
    ("error", -0.4),
    ("fail", -0.5),
    ("failed", -0.5),
    ("failure", -0.5),
    ("unable", -0.5),
    ("suspend", -0.6),
    ("suspended", -0.6),
    ("suspension", -0.6),
    ("locked", -0.5),
    ("blocked", -0.5),
    ("disabled", -0.5),
    ("terminated", -0.6),
    ("cancelled", -0.4),
    ("canceled", -0.4),
    ("expired", -0.4),
    ("expire", -0.4),
    ("overdue", -0.5),
    ("penalty", -0.6),
    ("fraud", -0.8),
    ("fraudulent", -0.8),
    ("unauthorized", -0.6),
    ("illegal", -0.5),
    ("suspicious", -0.6),
    ("unusual", -0.3),
    ("compromised", -0.7),
    ("breach", -0.6),
    ("risk", -0.4),
    ("threat", -0.6),
    ("danger", -0.7),
    ("dangerous", -0.6),
    ("warning", -0.4),
    ("alert", -0.3),
    ("violation", -0.6),
    ("lose", -0.5),
    ("lost", -0.4),
    ("loss", -0.5),
    ("angry", -0.5),
    ("sad", -0.5),
    ("worst", -1.0),
    ("worse", -0.4),
    ("hate", -0.8),
    ("annoying", -0.8),
    ("disappointed", -0.75),
    ("difficult", -0.5),
    ("impossible", -0.67),
    ("late", -0.3),
    ("urgent", -0.2),
    ("final", -0.1),
    ("limited", -0.07),
];

/// Word → polarity table.
#[derive(Debug, Clone)]
pub struct Lexicon {
    words: HashMap<String, f64>,
}

impl Lexicon {
    /// Build a lexicon from `(word, polarity)` pairs.
    ///
    /// Words are lowercased; later entries win.
    ///
    /// # Errors
    ///
    /// Returns [`LexiconError::OutOfRange`] if a polarity is outside
    /// `[-1.0, 1.0]` or not a number.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, LexiconError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut words = HashMap::new();
        for (word, polarity) in entries {
            let word = word.as_ref().trim().to_lowercase();
            if !(-1.0..=1.0).contains(&polarity) {
                return Err(LexiconError::OutOfRange { word, polarity });
            }
            if !word.is_empty() {
                words.insert(word, polarity);
            }
        }
        Ok(Self { words })
    }

    /// Parse a lexicon from a JSON object `{ "word": polarity, ... }`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a polarity is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, LexiconError> {
        let entries: HashMap<String, f64> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Load a lexicon from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LexiconError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Polarity of a single word, if known.
    #[must_use]
    pub fn get(&self, word: &str) -> Option<f64> {
        self.words.get(word).copied()
    }

    /// Number of scored words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the lexicon scores no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            words: BUILTIN
                .iter()
                .map(|(word, polarity)| ((*word).to_string(), *polarity))
                .collect(),
        }
    }
}

fn is_negation(token: &str) -> bool {
    NEGATIONS.contains(&token) || token.ends_with("n't")
}

fn intensity(token: &str) -> Option<f64> {
    INTENSIFIERS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, factor)| *factor)
}

impl PolarityAnalyzer for Lexicon {
    fn polarity(&self, text: &str) -> f64 {
        let mut total = 0.0;
        let mut scored = 0_u32;
        let mut factor = 1.0;
        let mut negated = false;

        let tokens = text
            .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase().replace('\u{2019}', "'"));

        for token in tokens {
            if is_negation(&token) {
                negated = true;
                continue;
            }
            if let Some(multiplier) = intensity(&token) {
                factor *= multiplier;
                continue;
            }
            if let Some(polarity) = self.get(&token) {
                let mut score = polarity * factor;
                if negated {
                    score *= NEGATION_FACTOR;
                }
                total += score.clamp(-1.0, 1.0);
                scored += 1;
            }
            factor = 1.0;
            negated = false;
        }

        if scored == 0 {
            0.0
        } else {
            (total / f64::from(scored)).clamp(-1.0, 1.0)
        }
    }
}

/// Flags a message whose polarity falls below a threshold.
#[derive(Debug, Clone)]
pub struct SentimentClassifier<A = Lexicon> {
    analyzer: A,
    threshold: f64,
}

impl SentimentClassifier<Lexicon> {
    /// Built-in lexicon, flagging any negative polarity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_analyzer(Lexicon::default(), 0.0)
    }
}

impl Default for SentimentClassifier<Lexicon> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: PolarityAnalyzer> SentimentClassifier<A> {
    /// Use a custom analyzer and threshold.
    #[must_use]
    pub const fn with_analyzer(analyzer: A, threshold: f64) -> Self {
        Self {
            analyzer,
            threshold,
        }
    }

    /// Polarity below which a message is flagged.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl<A: PolarityAnalyzer> Classifier for SentimentClassifier<A> {
    fn name(&self) -> &str {
        "sentiment"
    }

    fn classify(&self, subject: Option<&str>, body: &str) -> Result<Verdict, ClassifierError> {
        let polarity = self.analyzer.polarity(&joined_text(subject, body));
        if !(-1.0..=1.0).contains(&polarity) {
            return Err(ClassifierError::ScoreOutOfRange {
                score: polarity,
                min: -1.0,
                max: 1.0,
            });
        }

        let verdict = if polarity < self.threshold {
            Verdict::flagged(format!(
                "polarity {polarity:.2} below {:.2}",
                self.threshold
            ))
        } else {
            Verdict::clean(format!("polarity {polarity:.2}"))
        };
        Ok(verdict.with_score(polarity))
    }
}
