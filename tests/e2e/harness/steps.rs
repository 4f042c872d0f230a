use std::time::Duration;

use super::assertions::Assertion;
use folio_core::RepositoryRecord;

/// A change applied to an existing repository record
#[derive(Debug, Clone)]
pub enum RecordUpdate {
    Readme(String),
    Description(String),
    SkillsIndex(String),
    Language { name: String, bytes: u64 },
    Files(Vec<String>),
    Context(serde_json::Value),
    /// Bumps `updated_at` only
    Touch,
}

/// All possible actions in a test scenario
#[derive(Debug)]
pub enum ScenarioStep {
    // Source changes
    AddRepository {
        record: RepositoryRecord,
    },
    UpdateRepository {
        name: String,
        update: RecordUpdate,
    },
    RemoveRepository {
        name: String,
    },
    CorruptRecord {
        name: String,
    },

    // Engine operations
    Load,
    Query {
        query: String,
    },
    Cleanup {
        dry_run: bool,
        batch_size: usize,
        prune_stale: bool,
    },

    // Cache tampering
    CorruptCachedRepository {
        name: String,
    },

    // Time control
    Wait {
        duration: Duration,
    },

    // Process lifecycle
    Restart,

    // Assertions (can be interspersed)
    Assert {
        assertion: Assertion,
    },
}
