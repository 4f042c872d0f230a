//! Aggregation of the three relevance signals into a ranked shortlist.
//!
//! Each sub-score is standardized per signal with a saturating transform
//! `s / (s + k)`, so `total_score` depends only on the record's own three
//! sub-scores and never on which other repositories were ranked alongside it.

use crate::composition::CompositionScorer;
use crate::config::ScoringConfig;
use crate::language::LanguageScorer;
use crate::semantic::SemanticScorer;
use crate::taxonomy::is_known_language;
use crate::tokenize::{tokenize, RepositoryTerms};
use crate::types::{RepositoryRecord, ScoreRecord, ShortlistEntry, Tier};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Result of ranking a repository set against a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Every repository, best first.
    pub records: Vec<ScoreRecord>,
    /// Repositories selected for the assembled context.
    pub shortlist: Vec<ShortlistEntry>,
    /// True when nothing cleared the threshold or the query was not technical.
    pub fallback_used: bool,
    /// Normalized query tokens.
    pub query_tokens: BTreeSet<String>,
}

impl Ranking {
    /// Score record for `owner/name`.
    pub fn record(&self, repository: &str) -> Option<&ScoreRecord> {
        self.records.iter().find(|r| r.repository == repository)
    }
}

/// Scores, standardizes and ranks repositories.
///
/// Holds its weights immutably; construct a new ranker to score with
/// different weights.
///
/// # Examples
///
/// ```
/// use folio_core::{Ranker, RepositoryRecord, ScoringConfig};
///
/// let mut repo = RepositoryRecord::new("ada", "engine");
/// repo.languages.insert("Rust".into(), 1000);
///
/// let ranker = Ranker::new(ScoringConfig::default());
/// let ranking = ranker.rank(&[repo], "rust engine");
/// assert_eq!(ranking.shortlist.len(), 1);
/// assert!(ranking.records[0].language_score > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Ranker {
    config: ScoringConfig,
    semantic: SemanticScorer,
    language: LanguageScorer,
    composition: CompositionScorer,
}

struct Scored<'a> {
    record: &'a RepositoryRecord,
    full_name: String,
    semantic: f64,
    language: f64,
    composition: f64,
    total: f64,
    technical_match: bool,
}

impl Ranker {
    /// Creates a ranker with the given weights.
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            semantic: SemanticScorer::new(&config),
            language: LanguageScorer::new(&config),
            composition: CompositionScorer::new(&config),
            config,
        }
    }

    /// The weights this ranker was built with.
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Combines three raw sub-scores into a total in `[0, 1)`.
    ///
    /// Pure: the same inputs always give the same bits.
    pub fn total_score(&self, semantic: f64, language: f64, composition: f64) -> f64 {
        let k = &self.config.saturation;
        let w = &self.config.signals;
        w.semantic * saturate(semantic, k.semantic)
            + w.language * saturate(language, k.language)
            + w.composition * saturate(composition, k.composition)
    }

    /// Ranks `records` against `query`.
    ///
    /// Total for every input: an empty repository set yields an empty ranking
    /// and an empty query ranks everything on composition and tie-break alone.
    pub fn rank(&self, records: &[RepositoryRecord], query: &str) -> Ranking {
        let query_tokens = tokenize(query);
        if records.is_empty() {
            return Ranking {
                records: Vec::new(),
                shortlist: Vec::new(),
                fallback_used: false,
                query_tokens,
            };
        }

        let mut scored: Vec<Scored<'_>> = records
            .iter()
            .map(|record| {
                let terms = RepositoryTerms::from_record(record);
                let semantic = self.semantic.score(&query_tokens, &terms);
                let language = self.language.score(&query_tokens, &record.languages);
                Scored {
                    record,
                    full_name: record.full_name(),
                    semantic: semantic.total,
                    language: language.score,
                    composition: 0.0,
                    total: self.total_score(semantic.total, language.score, 0.0),
                    technical_match: semantic.technical_match || language.score > 0.0,
                }
            })
            .collect();

        // Composition only for the provisional leaders.
        scored.sort_by(compare);
        for entry in scored.iter_mut().take(self.config.composition_top_n) {
            entry.composition = self.composition.score(&entry.record.file_tree).score;
            entry.total = self.total_score(entry.semantic, entry.language, entry.composition);
        }
        scored.sort_by(compare);

        let top = scored.first().map(|s| s.total).unwrap_or(0.0);
        let technical_query = scored.iter().any(|s| s.technical_match)
            || query_tokens.iter().any(|t| is_known_language(t));
        let fallback_used = top < self.config.relevance_threshold || !technical_query;

        let selected: Vec<&Scored<'_>> = if fallback_used {
            info!(
                top_score = top,
                threshold = self.config.relevance_threshold,
                technical_query,
                "no repository cleared the threshold, using fallback shortlist"
            );
            scored
                .iter()
                .take(self.config.fallback_shortlist_size)
                .collect()
        } else {
            scored
                .iter()
                .filter(|s| s.total >= self.config.relevance_threshold)
                .take(self.config.max_shortlist_size)
                .collect()
        };

        let shortlist = selected
            .iter()
            .enumerate()
            .map(|(i, s)| ShortlistEntry {
                repository: s.full_name.clone(),
                rank: i + 1,
                total_score: s.total,
                tier: Tier::for_rank(i + 1),
            })
            .collect();

        let records = scored
            .iter()
            .map(|s| ScoreRecord {
                repository: s.full_name.clone(),
                semantic_score: s.semantic,
                language_score: s.language,
                composition_score: s.composition,
                total_score: s.total,
                technical_match: s.technical_match,
                updated_at: s.record.metadata.updated_at,
            })
            .collect();

        debug!(
            repositories = scored.len(),
            fallback_used,
            "ranked repositories"
        );

        Ranking {
            records,
            shortlist,
            fallback_used,
            query_tokens,
        }
    }
}

fn saturate(value: f64, k: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        0.0
    } else {
        value / (value + k)
    }
}

/// Total descending, then most recently updated, then name.
fn compare(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    b.total
        .total_cmp(&a.total)
        .then_with(|| b.record.metadata.updated_at.cmp(&a.record.metadata.updated_at))
        .then_with(|| a.full_name.cmp(&b.full_name))
}
