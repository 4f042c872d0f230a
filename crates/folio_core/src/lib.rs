//! Folio Core Library
//!
//! A repository relevance engine for answering questions about a portfolio of
//! code repositories, providing:
//! - Query and metadata tokenization
//! - Content fingerprints and a fingerprint-validated cache
//! - Semantic, language and file-composition scoring
//! - Ranking with a relevance threshold and fallback shortlist
//! - Tiered, size-budgeted context assembly
//!
//! # Quick Start
//!
//! ```
//! use folio_core::{Ranker, RepositoryRecord, ScoringConfig};
//! use serde_json::json;
//!
//! let mut shop = RepositoryRecord::new("ada", "storefront");
//! shop.languages.insert("Python".into(), 8000);
//! shop.languages.insert("HTML".into(), 2000);
//! shop.context = Some(json!({"tech_stack": {"primary": ["Flask", "SQLAlchemy"]}}));
//!
//! let mut kernel = RepositoryRecord::new("ada", "kernel");
//! kernel.languages.insert("C".into(), 10_000);
//!
//! let ranking = Ranker::new(ScoringConfig::default()).rank(&[kernel, shop], "python flask projects");
//! assert_eq!(ranking.shortlist[0].repository, "ada/storefront");
//! assert!(!ranking.fallback_used);
//! ```
//!
//! # Features
//!
//! ## Fingerprints
//!
//! Fingerprints are BLAKE3 digests over a canonical serialization, so map
//! ordering never changes them:
//!
//! ```
//! use folio_core::{fingerprint, Fingerprint};
//!
//! let fp = fingerprint(&vec!["Flask", "Redis"]).unwrap();
//! assert_eq!(Fingerprint::from_hex(&fp.as_hex()).unwrap(), fp);
//! ```
//!
//! ## Fingerprint-Validated Cache
//!
//! Entries never expire; they are served only while the stored fingerprint
//! matches the live one:
//!
//! ```
//! use folio_core::{fingerprint, CacheConfig, CacheKey, CacheStatus, CacheStore};
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let store = CacheStore::open(tmp.path().join("cache.redb"), &CacheConfig::default()).unwrap();
//! let key = CacheKey::repository("ada", "engine");
//! let v1 = fingerprint("v1").unwrap();
//!
//! store.save(&key, b"payload", v1).unwrap();
//! assert_eq!(store.get(&key, &v1).status, CacheStatus::Valid);
//! assert_eq!(store.get(&key, &fingerprint("v2").unwrap()).status, CacheStatus::Stale);
//! ```

mod assemble;
mod cache;
mod cleanup;
mod composition;
mod config;
mod document;
mod engine;
mod error;
mod fetch;
mod fingerprint;
mod language;
mod llm;
mod rank;
mod semantic;
mod source;
mod taxonomy;
mod tokenize;
mod types;
mod workspace;

pub use assemble::{
    estimate_tokens, truncate_at_word, AssembledContext, ContextAssembler, ContextSection,
    FALLBACK_NOTE, TRUNCATION_MARKER,
};
pub use cache::{
    CacheDomain, CacheEntry, CacheKey, CacheStats, CacheStatus, CacheStore, BUNDLE_IDENTIFIER,
    CACHE_SCHEMA_VERSION,
};
pub use cleanup::{
    cleanup, CleanupConfig, CleanupProgressCallback, CleanupReport, LiveFingerprints, LiveSnapshot,
    LiveState, DEFAULT_CLEANUP_BATCH_SIZE,
};
pub use composition::{CompositionScore, CompositionScorer};
pub use config::{
    CacheConfig, CategoryWeights, CompositionWeights, Config, ContextBudget, FetchConfig,
    MatchWeights, SaturationConstants, ScoringConfig, SignalWeights, SourceConfig,
    DEFAULT_FALLBACK_SHORTLIST_SIZE, EXTENDED_FALLBACK_SHORTLIST_SIZE,
    PERMISSIVE_RELEVANCE_THRESHOLD, TUNED_RELEVANCE_THRESHOLD,
};
pub use document::{get_path, lookup, path_str, path_str_list, ContextSummary, DEFAULT_PROJECT_TYPE};
pub use engine::{Answer, LoadedRepositories, QueryOutcome, RelevanceEngine, NO_RELEVANT_PROJECTS};
pub use error::{FolioError, Result};
pub use fetch::{fetch_all, FetchBatch, FetchFailure, FetchFailureKind, FetchResult, RepositorySource};
pub use fingerprint::{bundle_fingerprint, canonical_json, fingerprint, training_fingerprint, Fingerprint};
pub use language::{LanguageScore, LanguageScorer};
pub use llm::{LanguageModel, LlmFailure};
pub use rank::{Ranker, Ranking};
pub use semantic::{CategoryHits, SemanticScore, SemanticScorer};
pub use source::DirectorySource;
pub use taxonomy::{
    classify_path, is_known_language, language_for_path, lookup_language, FileCategory,
    LanguageDef, LANGUAGES,
};
pub use tokenize::{flatten, tokenize, whole_words, RepositoryTerms, TermCategory, TermSet};
pub use types::*;
pub use workspace::{Workspace, FOLIO_DIR};
