//! Core data types shared by the scorers, the cache and the fetch layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Language name → byte count, as reported by the fetch layer.
///
/// A `BTreeMap` keeps keys unique and iteration order stable.
pub type LanguageMap = BTreeMap<String, u64>;

/// Repository metadata relevant to ranking and change detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryMetadata {
    /// Creation time (Unix seconds).
    pub created_at: i64,
    /// Last metadata update (Unix seconds). Used as the ranking tie-break.
    pub updated_at: i64,
    /// Last push (Unix seconds).
    pub pushed_at: i64,
    /// Repository size in bytes.
    pub size_bytes: u64,
    /// Whether the repository is a fork.
    pub fork: bool,
    /// Default branch head commit, when the fetch layer knows it.
    pub head_sha: Option<String>,
}

/// A repository as delivered by the fetch layer. Read-only to the scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Owning user or organization.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// One-line description.
    #[serde(default)]
    pub description: Option<String>,
    /// Topic labels.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Timestamps, size and fork flag.
    #[serde(default)]
    pub metadata: RepositoryMetadata,
    /// Language byte counts.
    #[serde(default)]
    pub languages: LanguageMap,
    /// Optional structured context document.
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    /// Relative file paths, recursively enumerated.
    #[serde(default)]
    pub file_tree: Vec<String>,
    /// README text.
    #[serde(default)]
    pub readme: Option<String>,
    /// Skills index text.
    #[serde(default)]
    pub skills_index: Option<String>,
}

impl RepositoryRecord {
    /// Creates a record with only identity set.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            description: None,
            topics: Vec::new(),
            metadata: RepositoryMetadata::default(),
            languages: LanguageMap::new(),
            context: None,
            file_tree: Vec::new(),
            readme: None,
            skills_index: None,
        }
    }

    /// Returns `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Total bytes across all languages.
    pub fn total_language_bytes(&self) -> u64 {
        self.languages
            .values()
            .fold(0u64, |acc, bytes| acc.saturating_add(*bytes))
    }

    /// Cheap listing view of this record.
    pub fn summary(&self) -> RepositorySummary {
        RepositorySummary {
            owner: self.owner.clone(),
            name: self.name.clone(),
            updated_at: self.metadata.updated_at,
            pushed_at: self.metadata.pushed_at,
            size_bytes: self.metadata.size_bytes,
            head_sha: self.metadata.head_sha.clone(),
        }
    }
}

/// What a repository listing returns: enough to tell whether content changed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepositorySummary {
    /// Owning user or organization.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Last metadata update (Unix seconds).
    pub updated_at: i64,
    /// Last push (Unix seconds).
    pub pushed_at: i64,
    /// Repository size in bytes.
    pub size_bytes: u64,
    /// Default branch head commit.
    pub head_sha: Option<String>,
}

/// Detail level given to a shortlisted repository in the assembled context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Rank 1: full detail.
    Primary,
    /// Rank 2: reduced excerpt.
    Secondary,
    /// Rank 3 and below: name and one-line description.
    Mentioned,
}

impl Tier {
    /// Tier for a 1-based rank.
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            0 | 1 => Tier::Primary,
            2 => Tier::Secondary,
            _ => Tier::Mentioned,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
            Tier::Mentioned => "mentioned",
        };
        f.write_str(s)
    }
}

/// Per-repository scores.
///
/// `total_score` is a pure function of the three sub-scores, see
/// [`crate::Ranker::total_score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// `owner/name` of the scored repository.
    pub repository: String,
    /// Semantic/lexical score against structured metadata.
    pub semantic_score: f64,
    /// Language byte-share score.
    pub language_score: f64,
    /// File composition score (0 unless among the provisional leaders).
    pub composition_score: f64,
    /// Combined, standardized score.
    pub total_score: f64,
    /// Whether any language or tech term matched the query.
    pub technical_match: bool,
    /// Last update timestamp used as tie-break.
    pub updated_at: i64,
}

/// A repository selected for the assembled context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistEntry {
    /// `owner/name` of the repository.
    pub repository: String,
    /// 1-based rank.
    pub rank: usize,
    /// Total score at selection time.
    pub total_score: f64,
    /// Detail tier derived from the rank.
    pub tier: Tier,
}
