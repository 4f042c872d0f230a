//! Language scoring against a repository's byte-weighted language map.

use crate::config::ScoringConfig;
use crate::taxonomy::is_known_language;
use crate::tokenize::whole_words;
use crate::types::LanguageMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Language score of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageScore {
    /// Scaled proportion, comparable with the semantic score.
    pub score: f64,
    /// Languages the query named, in map order.
    pub matched: Vec<String>,
    /// Matched bytes over total bytes.
    pub proportion: f64,
}

impl LanguageScore {
    fn zero() -> Self {
        Self {
            score: 0.0,
            matched: Vec::new(),
            proportion: 0.0,
        }
    }
}

/// Scores how much of a repository is written in languages the query names.
#[derive(Debug, Clone)]
pub struct LanguageScorer {
    scale: f64,
    validate: bool,
}

impl LanguageScorer {
    /// Creates a scorer from the language settings of `config`.
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            scale: config.language_scale,
            validate: config.validate_languages,
        }
    }

    /// Scores one language map.
    ///
    /// A language matches when every word of its name is a query token, so
    /// `java` never matches `JavaScript`. With validation on, names outside the
    /// canonical taxonomy never match.
    pub fn score(&self, query: &BTreeSet<String>, languages: &LanguageMap) -> LanguageScore {
        let total = languages
            .values()
            .fold(0u64, |acc, bytes| acc.saturating_add(*bytes));
        if query.is_empty() || total == 0 {
            return LanguageScore::zero();
        }

        let mut matched = Vec::new();
        let mut matched_bytes = 0u64;
        for (name, bytes) in languages {
            if self.validate && !is_known_language(name) {
                continue;
            }
            let words = whole_words(name);
            if !words.is_empty() && words.iter().all(|w| query.contains(w)) {
                matched.push(name.clone());
                matched_bytes = matched_bytes.saturating_add(*bytes);
            }
        }

        if matched.is_empty() {
            return LanguageScore::zero();
        }

        let proportion = matched_bytes as f64 / total as f64;
        LanguageScore {
            score: proportion * self.scale,
            matched,
            proportion,
        }
    }
}
