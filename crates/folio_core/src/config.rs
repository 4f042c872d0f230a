//! Configuration types for the relevance engine.
//!
//! Scoring weights live in an immutable [`ScoringConfig`] that is handed to the
//! ranker at construction time, so tests can swap weights without touching
//! shared state.

use crate::error::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Comprehensive configuration for a folio workspace.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Relevance scoring weights and thresholds.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Size budgets for assembled LLM context.
    #[serde(default)]
    pub context: ContextBudget,

    /// Repository fetch fan-out settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Cache store settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// On-disk repository source settings.
    #[serde(default)]
    pub source: SourceConfig,
}

impl Config {
    /// Load configuration from `<folio_dir>/config.toml`, or defaults if absent.
    pub fn load(folio_dir: &Path) -> Result<Self> {
        let path = folio_dir.join("config.toml");
        if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| FolioError::ConfigError(format!("failed to read config: {}", e)))?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| FolioError::ConfigError(format!("failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to `<folio_dir>/config.toml`.
    pub fn save(&self, folio_dir: &Path) -> Result<()> {
        let path = folio_dir.join("config.toml");
        let content = toml::to_string_pretty(self)
            .map_err(|e| FolioError::ConfigError(format!("failed to serialize config: {}", e)))?;
        fs::write(&path, content)
            .map_err(|e| FolioError::ConfigError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    /// Rejects values that would make scoring or fetching meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.scoring.fallback_shortlist_size == 0 {
            return Err(FolioError::ConfigError(
                "scoring.fallback_shortlist_size must be at least 1".into(),
            ));
        }
        if self.scoring.max_shortlist_size == 0 {
            return Err(FolioError::ConfigError(
                "scoring.max_shortlist_size must be at least 1".into(),
            ));
        }
        if self.fetch.max_concurrency == 0 {
            return Err(FolioError::ConfigError(
                "fetch.max_concurrency must be at least 1".into(),
            ));
        }
        let s = &self.scoring.saturation;
        if s.semantic <= 0.0 || s.language <= 0.0 || s.composition <= 0.0 {
            return Err(FolioError::ConfigError(
                "scoring.saturation constants must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Weights applied to exact and partial token matches within one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    /// Weight per exact token match.
    pub exact: f64,
    /// Weight per substring (partial) match.
    pub partial: f64,
}

impl MatchWeights {
    /// Creates a weight pair.
    pub const fn new(exact: f64, partial: f64) -> Self {
        Self { exact, partial }
    }
}

/// Base weights per term category for the semantic scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    /// Language names (an explicit language mention is a strong signal).
    pub language: MatchWeights,
    /// Tech stack entries.
    pub tech: MatchWeights,
    /// Skill manifest entries.
    pub skill: MatchWeights,
    /// Free-text description fields.
    pub description: MatchWeights,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            language: MatchWeights::new(10.0, 0.0),
            tech: MatchWeights::new(8.0, 4.0),
            skill: MatchWeights::new(6.0, 3.0),
            description: MatchWeights::new(2.0, 1.0),
        }
    }
}

/// Weight per file category for the composition scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionWeights {
    /// Source code files.
    pub programming: f64,
    /// Data files (csv, json, yaml...).
    pub data: f64,
    /// Markup files (html, xml...).
    pub markup: f64,
    /// Prose files (markdown, text...).
    pub prose: f64,
    /// Unclassified files.
    pub nil: f64,
}

impl Default for CompositionWeights {
    fn default() -> Self {
        Self {
            programming: 1.0,
            data: 0.4,
            markup: 0.3,
            prose: 0.2,
            nil: 0.0,
        }
    }
}

/// Half-saturation constants used to standardize each sub-score onto `[0, 1)`.
///
/// A raw score equal to the constant standardizes to 0.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationConstants {
    /// Semantic score constant.
    pub semantic: f64,
    /// Language score constant.
    pub language: f64,
    /// Composition score constant.
    pub composition: f64,
}

impl Default for SaturationConstants {
    fn default() -> Self {
        Self {
            semantic: 10.0,
            language: 5.0,
            composition: 5.0,
        }
    }
}

/// Contribution of each standardized sub-score to the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    /// Semantic/lexical signal.
    pub semantic: f64,
    /// Language byte-share signal.
    pub language: f64,
    /// File composition signal.
    pub composition: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            semantic: 0.5,
            language: 0.3,
            composition: 0.2,
        }
    }
}

/// Relevance threshold tuned against real portfolio queries.
pub const TUNED_RELEVANCE_THRESHOLD: f64 = 0.25;

/// Permissive threshold, useful when exercising the ranker by hand.
pub const PERMISSIVE_RELEVANCE_THRESHOLD: f64 = 0.05;

/// Shortlist size used when nothing clears the threshold.
pub const DEFAULT_FALLBACK_SHORTLIST_SIZE: usize = 3;

/// Wider fallback size, kept for consumers that want more candidates.
pub const EXTENDED_FALLBACK_SHORTLIST_SIZE: usize = 5;

/// Immutable scoring configuration handed to the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Per-category weights for the semantic scorer.
    pub categories: CategoryWeights,
    /// Multiplier applied to the matched language byte proportion.
    pub language_scale: f64,
    /// Only count languages present in the canonical taxonomy.
    pub validate_languages: bool,
    /// Per-category weights for the composition scorer.
    pub composition: CompositionWeights,
    /// Multiplier applied to the normalized composition score.
    pub composition_scale: f64,
    /// Number of provisional leaders that get a composition score.
    pub composition_top_n: usize,
    /// Standardization constants.
    pub saturation: SaturationConstants,
    /// Weights of the standardized sub-scores in the total.
    pub signals: SignalWeights,
    /// Minimum total score for a repository to be considered relevant.
    pub relevance_threshold: f64,
    /// Shortlist size in fallback mode.
    pub fallback_shortlist_size: usize,
    /// Maximum shortlist size when repositories clear the threshold.
    pub max_shortlist_size: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            categories: CategoryWeights::default(),
            language_scale: 10.0,
            validate_languages: true,
            composition: CompositionWeights::default(),
            composition_scale: 10.0,
            composition_top_n: 5,
            saturation: SaturationConstants::default(),
            signals: SignalWeights::default(),
            relevance_threshold: TUNED_RELEVANCE_THRESHOLD,
            fallback_shortlist_size: DEFAULT_FALLBACK_SHORTLIST_SIZE,
            max_shortlist_size: EXTENDED_FALLBACK_SHORTLIST_SIZE,
        }
    }
}

/// Size budgets for the assembled context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextBudget {
    /// Hard ceiling on characters.
    pub max_chars: usize,
    /// Hard ceiling on estimated tokens.
    pub max_tokens: usize,
    /// README excerpt length for the primary repository.
    pub primary_readme_chars: usize,
    /// Size of the whole primary section (README + skills index).
    pub primary_section_chars: usize,
    /// README excerpt length for the secondary repository.
    pub secondary_readme_chars: usize,
    /// Length of the one-line description used for mentioned repositories.
    pub description_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_chars: 12_000,
            max_tokens: 3_000,
            primary_readme_chars: 3_000,
            primary_section_chars: 5_000,
            secondary_readme_chars: 800,
            description_chars: 160,
        }
    }
}

/// Repository fetch fan-out settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Deadline for a whole fetch fan-out, in milliseconds. Repositories
    /// still pending when it passes fail with a timeout.
    pub timeout_ms: u64,
    /// Maximum number of fetches in flight.
    pub max_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_concurrency: 8,
        }
    }
}

impl FetchConfig {
    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Cache store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disable to bypass the cache entirely (every lookup reports `Disabled`).
    pub enabled: bool,
    /// Compression level for zstd (1-22, default: 3).
    pub compression_level: i32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            compression_level: 3,
        }
    }
}

/// On-disk repository source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory holding `<owner>/<name>.json` records, relative to `.folio`.
    pub path: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("repos"),
        }
    }
}
