use super::assertions::Assertion;
use super::runner::ScenarioRunner;
use super::steps::{RecordUpdate, ScenarioStep};
use folio_core::{Config, ContextBudget, RepositoryRecord, ScoringConfig, Tier};
use std::time::Duration;

/// Owner used when a scenario does not name one
pub const DEFAULT_OWNER: &str = "ada";

/// Fluent DSL for building test scenarios
pub struct Scenario {
    name: String,
    owner: String,
    fixture: Option<String>,
    initial_records: Vec<RepositoryRecord>,
    config: Config,
    steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Create a new scenario with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            fixture: None,
            initial_records: Vec::new(),
            config: Config::default(),
            steps: Vec::new(),
        }
    }

    // ===== Initial setup =====

    /// Owner whose repositories the scenario works on
    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = owner.to_string();
        self
    }

    /// Add a record to the initial source
    pub fn with_repository(mut self, record: RepositoryRecord) -> Self {
        self.initial_records.push(record);
        self
    }

    /// Add several records to the initial source
    pub fn with_repositories(mut self, records: Vec<RepositoryRecord>) -> Self {
        self.initial_records.extend(records);
        self
    }

    /// Load initial records from `tests/fixtures/<name>`
    pub fn from_fixture(mut self, fixture_name: &str) -> Self {
        self.fixture = Some(fixture_name.to_string());
        self
    }

    /// Override the context budgets
    pub fn with_budget(mut self, budget: ContextBudget) -> Self {
        self.config.context = budget;
        self
    }

    /// Override the scoring weights
    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.config.scoring = scoring;
        self
    }

    // ===== Source changes =====

    /// A repository appears in the source
    pub fn add_repository(mut self, record: RepositoryRecord) -> Self {
        self.steps.push(ScenarioStep::AddRepository { record });
        self
    }

    /// A repository record changes
    pub fn update_repository(mut self, name: &str, update: RecordUpdate) -> Self {
        self.steps.push(ScenarioStep::UpdateRepository {
            name: name.to_string(),
            update,
        });
        self
    }

    /// A repository disappears from the source
    pub fn remove_repository(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::RemoveRepository {
            name: name.to_string(),
        });
        self
    }

    /// A repository record becomes unreadable
    pub fn corrupt_record(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::CorruptRecord {
            name: name.to_string(),
        });
        self
    }

    // ===== Engine operations =====

    /// Load repositories through the cache
    pub fn load(mut self) -> Self {
        self.steps.push(ScenarioStep::Load);
        self
    }

    /// Run a query
    pub fn query(mut self, query: &str) -> Self {
        self.steps.push(ScenarioStep::Query {
            query: query.to_string(),
        });
        self
    }

    /// Run one cleanup batch
    pub fn cleanup(mut self, dry_run: bool, batch_size: usize) -> Self {
        self.steps.push(ScenarioStep::Cleanup {
            dry_run,
            batch_size,
            prune_stale: false,
        });
        self
    }

    /// Run one cleanup batch that also drops outdated entries
    pub fn cleanup_pruning_stale(mut self, batch_size: usize) -> Self {
        self.steps.push(ScenarioStep::Cleanup {
            dry_run: false,
            batch_size,
            prune_stale: true,
        });
        self
    }

    /// Overwrite a cached repository payload with garbage under a valid fingerprint
    pub fn corrupt_cached_repository(mut self, name: &str) -> Self {
        self.steps.push(ScenarioStep::CorruptCachedRepository {
            name: name.to_string(),
        });
        self
    }

    // ===== Time control =====

    /// Wait for a duration
    pub fn wait(mut self, duration: Duration) -> Self {
        self.steps.push(ScenarioStep::Wait { duration });
        self
    }

    /// Wait for N days
    pub fn wait_days(self, days: u64) -> Self {
        self.wait(Duration::from_secs(days * 86400))
    }

    // ===== Process lifecycle =====

    /// Drop the engine and reopen the workspace from disk
    pub fn restart(mut self) -> Self {
        self.steps.push(ScenarioStep::Restart);
        self
    }

    // ===== Assertions =====

    /// Add a general assertion
    pub fn assert(mut self, assertion: Assertion) -> Self {
        self.steps.push(ScenarioStep::Assert { assertion });
        self
    }

    /// Assert the last load's cache accounting
    pub fn assert_loaded(self, hits: usize, fetched: usize) -> Self {
        self.assert(Assertion::CacheHits(hits))
            .assert(Assertion::Fetched(fetched))
    }

    /// Assert the last query's top repository (`name`, owner implied)
    pub fn assert_top(self, name: &str) -> Self {
        let full = format!("{}/{}", self.owner, name);
        self.assert(Assertion::TopRepository(full))
    }

    /// Assert the tiers of the last assembled context
    pub fn assert_tiers(self, tiers: &[Tier]) -> Self {
        self.assert(Assertion::SectionTiers(tiers.to_vec()))
    }

    /// Assert the assembled context contains text
    pub fn assert_context_contains(self, text: &str) -> Self {
        self.assert(Assertion::ContextContains(text.to_string()))
    }

    /// Assert the number of cache entries
    pub fn assert_cache_entries(self, count: usize) -> Self {
        self.assert(Assertion::CacheEntryCount(count))
    }

    // ===== Execution =====

    /// Execute the scenario and return results
    pub fn run(self) -> ScenarioResult {
        let mut runner = match ScenarioRunner::new(
            &self.owner,
            self.fixture.as_deref(),
            &self.initial_records,
            &self.config,
        ) {
            Ok(r) => r,
            Err(e) => {
                return ScenarioResult {
                    name: self.name.clone(),
                    success: false,
                    steps_executed: 0,
                    failure_step: Some(0),
                    error: Some(format!("Failed to create runner: {:?}", e)),
                }
            }
        };

        match runner.execute(&self.steps) {
            Ok(()) => ScenarioResult {
                name: self.name,
                success: true,
                steps_executed: self.steps.len(),
                failure_step: None,
                error: None,
            },
            Err(e) => {
                let failure_step = runner.current_step();
                ScenarioResult {
                    name: self.name,
                    success: false,
                    steps_executed: failure_step,
                    failure_step: Some(failure_step),
                    error: Some(format!("{:?}", e)),
                }
            }
        }
    }
}

/// Result of running a scenario
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub steps_executed: usize,
    pub failure_step: Option<usize>,
    pub error: Option<String>,
}

impl ScenarioResult {
    /// Unwrap the result, panicking if it failed
    pub fn unwrap(self) {
        if !self.success {
            panic!(
                "Scenario '{}' failed at step {}: {}",
                self.name,
                self.failure_step.unwrap_or(0),
                self.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
    }

    /// Expect the result to be successful
    pub fn expect(self, msg: &str) {
        if !self.success {
            panic!(
                "{}: Scenario '{}' failed at step {}: {}",
                msg,
                self.name,
                self.failure_step.unwrap_or(0),
                self.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
    }
}
