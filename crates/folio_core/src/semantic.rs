//! Semantic/lexical scoring of a query against a repository's term sets.

use crate::config::{MatchWeights, ScoringConfig};
use crate::tokenize::{RepositoryTerms, TermCategory, TermSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Shortest token allowed to take part in a substring match.
const MIN_PARTIAL_CHARS: usize = 3;

/// Match counts for one term category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHits {
    /// Query tokens present verbatim in the category.
    pub exact: usize,
    /// Query tokens that only matched as a substring.
    pub partial: usize,
}

impl CategoryHits {
    /// Whether anything matched.
    pub fn any(&self) -> bool {
        self.exact > 0 || self.partial > 0
    }
}

/// Semantic score of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticScore {
    /// Weighted sum over all categories.
    pub total: f64,
    /// Hits per category.
    pub hits: BTreeMap<TermCategory, CategoryHits>,
    /// Whether a language or tech term contributed to the score.
    pub technical_match: bool,
}

impl SemanticScore {
    fn zero() -> Self {
        Self {
            total: 0.0,
            hits: BTreeMap::new(),
            technical_match: false,
        }
    }
}

/// Compares query tokens against per-category repository terms.
#[derive(Debug, Clone)]
pub struct SemanticScorer {
    weights: BTreeMap<TermCategory, MatchWeights>,
}

impl SemanticScorer {
    /// Creates a scorer with the category weights of `config`.
    pub fn new(config: &ScoringConfig) -> Self {
        let c = &config.categories;
        let weights = BTreeMap::from([
            (TermCategory::Language, c.language),
            (TermCategory::Tech, c.tech),
            (TermCategory::Skill, c.skill),
            (TermCategory::Description, c.description),
        ]);
        Self { weights }
    }

    /// Scores one repository.
    ///
    /// An empty query always scores zero.
    pub fn score(&self, query: &BTreeSet<String>, terms: &RepositoryTerms) -> SemanticScore {
        if query.is_empty() {
            return SemanticScore::zero();
        }

        let mut result = SemanticScore::zero();
        for category in TermCategory::ALL {
            let weights = self.weights[&category];
            let hits = count_hits(query, terms.get(category));
            let contribution =
                hits.exact as f64 * weights.exact + hits.partial as f64 * weights.partial;

            if category.is_technical() && contribution > 0.0 {
                result.technical_match = true;
            }
            result.total += contribution;
            result.hits.insert(category, hits);
        }
        result
    }
}

/// Counts exact and partial hits of the query in one term set.
///
/// A query token counts at most once per category; an exact hit shadows any
/// partial hit for the same token.
fn count_hits(query: &BTreeSet<String>, set: &TermSet) -> CategoryHits {
    let mut hits = CategoryHits::default();
    for token in query {
        if set.tokens.contains(token) {
            hits.exact += 1;
        } else if set.tokens.iter().any(|term| is_partial_match(token, term)) {
            hits.partial += 1;
        }
    }
    hits
}

fn is_partial_match(a: &str, b: &str) -> bool {
    a.len() >= MIN_PARTIAL_CHARS
        && b.len() >= MIN_PARTIAL_CHARS
        && a != b
        && (a.contains(b) || b.contains(a))
}
