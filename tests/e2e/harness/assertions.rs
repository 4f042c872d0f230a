use anyhow::Result;
use folio_core::{DirectorySource, FetchFailureKind, RelevanceEngine, Tier};

/// Declarative assertions on engine state and the last operation's outcome
pub enum Assertion {
    // Last load
    LoadedCount(usize),
    CacheHits(usize),
    Fetched(usize),
    BundleHit(bool),
    FetchFailed {
        name: String,
        kind: FetchFailureKind,
    },
    TrainingChanged(Vec<String>),

    // Last query: ranking
    TopRepository(String),
    RankedAbove {
        higher: String,
        lower: String,
    },
    ShortlistLen(usize),
    FallbackUsed(bool),
    NoRelevantProjects,
    LanguageScoreZero(String),
    LanguageScorePositive(String),

    // Last query: context
    ContextContains(String),
    ContextNotContains(String),
    ContextWithinChars(usize),
    SectionTiers(Vec<Tier>),

    // Last cleanup
    CleanupInspected(usize),
    CleanupDeleted(usize),
    CleanupWouldDelete(usize),
    CleanupHasMore(bool),

    // Cache contents
    CacheEntryCount(usize),
    CacheHasKey(String),
    CacheMissingKey(String),

    // Custom
    Custom(Box<dyn Fn(&RelevanceEngine<DirectorySource>) -> Result<()> + Send + Sync>),
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadedCount(n) => write!(f, "LoadedCount({})", n),
            Self::CacheHits(n) => write!(f, "CacheHits({})", n),
            Self::Fetched(n) => write!(f, "Fetched({})", n),
            Self::BundleHit(b) => write!(f, "BundleHit({})", b),
            Self::FetchFailed { name, kind } => {
                write!(f, "FetchFailed {{ name: {:?}, kind: {:?} }}", name, kind)
            }
            Self::TrainingChanged(names) => write!(f, "TrainingChanged({:?})", names),
            Self::TopRepository(s) => write!(f, "TopRepository({:?})", s),
            Self::RankedAbove { higher, lower } => {
                write!(f, "RankedAbove {{ higher: {:?}, lower: {:?} }}", higher, lower)
            }
            Self::ShortlistLen(n) => write!(f, "ShortlistLen({})", n),
            Self::FallbackUsed(b) => write!(f, "FallbackUsed({})", b),
            Self::NoRelevantProjects => write!(f, "NoRelevantProjects"),
            Self::LanguageScoreZero(s) => write!(f, "LanguageScoreZero({:?})", s),
            Self::LanguageScorePositive(s) => write!(f, "LanguageScorePositive({:?})", s),
            Self::ContextContains(s) => write!(f, "ContextContains({:?})", s),
            Self::ContextNotContains(s) => write!(f, "ContextNotContains({:?})", s),
            Self::ContextWithinChars(n) => write!(f, "ContextWithinChars({})", n),
            Self::SectionTiers(tiers) => write!(f, "SectionTiers({:?})", tiers),
            Self::CleanupInspected(n) => write!(f, "CleanupInspected({})", n),
            Self::CleanupDeleted(n) => write!(f, "CleanupDeleted({})", n),
            Self::CleanupWouldDelete(n) => write!(f, "CleanupWouldDelete({})", n),
            Self::CleanupHasMore(b) => write!(f, "CleanupHasMore({})", b),
            Self::CacheEntryCount(n) => write!(f, "CacheEntryCount({})", n),
            Self::CacheHasKey(s) => write!(f, "CacheHasKey({:?})", s),
            Self::CacheMissingKey(s) => write!(f, "CacheMissingKey({:?})", s),
            Self::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}
