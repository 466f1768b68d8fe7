//! Intent classification from free-form text.
//!
//! Turns an utterance into an [`Intent`] by running it through the ordered
//! rule table in [`patterns`]. Classification is a pure function of the
//! table and the input.

pub mod patterns;

use tracing::debug;

use crate::types::Intent;
use patterns::PatternSet;

/// First-match-wins intent classifier.
pub struct IntentClassifier {
    patterns: PatternSet,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            patterns: PatternSet::new(),
        }
    }

    /// Classify `text`. Input no rule recognises yields an UNKNOWN intent
    /// with zero confidence and no entities.
    pub fn classify(&self, text: &str) -> Intent {
        match self.patterns.first_match(text) {
            Some(m) => {
                debug!(
                    intent = %m.kind,
                    matched = %m.matched_text,
                    entities = m.entities.len(),
                    "Intent classified"
                );
                Intent {
                    kind: m.kind,
                    entities: m.entities,
                    confidence: m.confidence,
                    raw_text: text.to_string(),
                }
            }
            None => {
                debug!(text = %text.trim(), "No intent rule matched");
                Intent::unknown(text)
            }
        }
    }
}
