//! File-composition scoring: how much of a repository's tree is source code.

use crate::config::{CompositionWeights, ScoringConfig};
use crate::taxonomy::{classify_path, FileCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Composition score of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionScore {
    /// Sum of all contributions.
    pub score: f64,
    /// Files per category.
    pub counts: BTreeMap<FileCategory, usize>,
    /// Weighted, normalized, scaled share of each category.
    pub contributions: BTreeMap<FileCategory, f64>,
    /// Files classified.
    pub total_files: usize,
}

impl CompositionScore {
    /// Category with the largest positive contribution, if any.
    pub fn dominant(&self) -> Option<FileCategory> {
        self.contributions
            .iter()
            .filter(|(_, v)| **v > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| *k)
    }
}

/// Classifies a file tree and weights it toward source-code density.
#[derive(Debug, Clone)]
pub struct CompositionScorer {
    weights: CompositionWeights,
    scale: f64,
}

impl CompositionScorer {
    /// Creates a scorer from the composition settings of `config`.
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            weights: config.composition.clone(),
            scale: config.composition_scale,
        }
    }

    fn weight(&self, category: FileCategory) -> f64 {
        match category {
            FileCategory::Programming => self.weights.programming,
            FileCategory::Data => self.weights.data,
            FileCategory::Markup => self.weights.markup,
            FileCategory::Prose => self.weights.prose,
            FileCategory::Nil => self.weights.nil,
        }
    }

    /// Scores a recursively enumerated file list.
    ///
    /// Directory entries (trailing `/`) and blank paths are ignored. The
    /// weighted count is divided by the number of files, so a large tree is
    /// not rewarded for its size alone.
    pub fn score(&self, file_tree: &[String]) -> CompositionScore {
        let mut counts: BTreeMap<FileCategory, usize> = BTreeMap::new();
        let mut total_files = 0usize;

        for path in file_tree {
            let path = path.trim();
            if path.is_empty() || path.ends_with('/') {
                continue;
            }
            *counts.entry(classify_path(path)).or_default() += 1;
            total_files += 1;
        }

        let mut contributions = BTreeMap::new();
        let mut score = 0.0;
        if total_files > 0 {
            for (category, count) in &counts {
                let share =
                    self.weight(*category) * *count as f64 / total_files as f64 * self.scale;
                contributions.insert(*category, share);
                score += share;
            }
        }

        CompositionScore {
            score,
            counts,
            contributions,
            total_files,
        }
    }
}
