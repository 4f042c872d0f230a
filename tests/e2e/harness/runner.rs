use super::assertions::Assertion;
use super::clock::MockClock;
use super::steps::{RecordUpdate, ScenarioStep};
use super::workspace::TestWorkspace;
use anyhow::{anyhow, Context, Result};
use folio_core::{
    CacheKey, CleanupConfig, CleanupReport, Config, DirectorySource, LoadedRepositories,
    QueryOutcome, RelevanceEngine, RepositoryRecord, RepositorySource,
};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Executes scenarios against a real folio workspace
pub struct ScenarioRunner {
    workspace: TestWorkspace,
    engine: Option<RelevanceEngine<DirectorySource>>,
    runtime: Runtime,
    clock: MockClock,
    owner: String,
    last_load: Option<LoadedRepositories>,
    last_query: Option<QueryOutcome>,
    last_cleanup: Option<CleanupReport>,
    current_step: usize,
}

impl ScenarioRunner {
    /// Create a new runner with an initialized workspace and initial records
    pub fn new(
        owner: &str,
        fixture: Option<&str>,
        initial_records: &[RepositoryRecord],
        config: &Config,
    ) -> Result<Self> {
        let workspace = TestWorkspace::empty()?;
        let folio = workspace.init_folio()?;
        config.save(&folio.folio_dir())?;

        if let Some(name) = fixture {
            workspace.load_fixture(name)?;
        }

        let clock = MockClock::new();
        let mut runner = Self {
            workspace,
            engine: None,
            runtime: Runtime::new().context("Failed to start tokio runtime")?,
            clock,
            owner: owner.to_string(),
            last_load: None,
            last_query: None,
            last_cleanup: None,
            current_step: 0,
        };
        for record in initial_records {
            runner.handle_add_repository(record)?;
        }
        runner.engine = Some(runner.open_engine()?);
        Ok(runner)
    }

    /// Get current step number
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Execute all steps in sequence
    pub fn execute(&mut self, steps: &[ScenarioStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            self.current_step = i;
            self.execute_step(step)
                .with_context(|| format!("Step {}: {:?}", i, step))?;
        }
        Ok(())
    }

    /// Execute a single step
    fn execute_step(&mut self, step: &ScenarioStep) -> Result<()> {
        match step {
            ScenarioStep::AddRepository { record } => self.handle_add_repository(record),
            ScenarioStep::UpdateRepository { name, update } => {
                self.handle_update_repository(name, update)
            }
            ScenarioStep::RemoveRepository { name } => {
                self.workspace.remove_record(&self.owner, name)
            }
            ScenarioStep::CorruptRecord { name } => {
                self.workspace
                    .write_raw_record(&self.owner, name, b"{ \"owner\": truncated")
            }

            ScenarioStep::Load => self.handle_load(),
            ScenarioStep::Query { query } => self.handle_query(query),
            ScenarioStep::Cleanup {
                dry_run,
                batch_size,
                prune_stale,
            } => self.handle_cleanup(*dry_run, *batch_size, *prune_stale),

            ScenarioStep::CorruptCachedRepository { name } => self.handle_corrupt_cache(name),

            ScenarioStep::Wait { duration } => self.handle_wait(*duration),
            ScenarioStep::Restart => self.handle_restart(),

            ScenarioStep::Assert { assertion } => self.handle_assertion(assertion),
        }
    }

    fn open_engine(&self) -> Result<RelevanceEngine<DirectorySource>> {
        Ok(self.workspace.open_folio()?.engine()?)
    }

    fn engine(&self) -> Result<&RelevanceEngine<DirectorySource>> {
        self.engine
            .as_ref()
            .ok_or_else(|| anyhow!("Engine not available"))
    }

    // ===== Source change handlers =====

    fn handle_add_repository(&mut self, record: &RepositoryRecord) -> Result<()> {
        let mut record = record.clone();
        record.owner = self.owner.clone();
        if record.metadata.updated_at == 0 {
            record.metadata.updated_at = self.clock.tick();
        }
        self.workspace.write_record(&record)
    }

    fn handle_update_repository(&mut self, name: &str, update: &RecordUpdate) -> Result<()> {
        let mut record = self.workspace.read_record(&self.owner, name)?;
        match update {
            RecordUpdate::Readme(text) => record.readme = Some(text.clone()),
            RecordUpdate::Description(text) => record.description = Some(text.clone()),
            RecordUpdate::SkillsIndex(text) => record.skills_index = Some(text.clone()),
            RecordUpdate::Language { name, bytes } => {
                record.languages.insert(name.clone(), *bytes);
            }
            RecordUpdate::Files(paths) => record.file_tree = paths.clone(),
            RecordUpdate::Context(doc) => record.context = Some(doc.clone()),
            RecordUpdate::Touch => {}
        }
        record.metadata.updated_at = self.clock.tick();
        self.workspace.write_record(&record)
    }

    // ===== Engine operation handlers =====

    fn handle_load(&mut self) -> Result<()> {
        let engine = self.engine()?;
        let loaded = self
            .runtime
            .block_on(engine.load_repositories(&self.owner))
            .map_err(|failure| anyhow!("Load failed: {}", failure))?;
        self.last_load = Some(loaded);
        Ok(())
    }

    fn handle_query(&mut self, query: &str) -> Result<()> {
        let engine = self.engine()?;
        let outcome = self.runtime.block_on(engine.query(&self.owner, query));
        self.last_query = Some(outcome);
        Ok(())
    }

    fn handle_cleanup(&mut self, dry_run: bool, batch_size: usize, prune_stale: bool) -> Result<()> {
        let start_after = self
            .last_cleanup
            .as_ref()
            .and_then(|report| report.next_cursor.clone());
        let config = CleanupConfig {
            dry_run,
            batch_size,
            start_after,
            prune_stale,
        };
        let engine = self.engine()?;
        let report = self
            .runtime
            .block_on(engine.cleanup(&self.owner, &config, None))?;
        self.last_cleanup = Some(report);
        Ok(())
    }

    fn handle_corrupt_cache(&mut self, name: &str) -> Result<()> {
        let engine = self.engine()?;
        let listing = self
            .runtime
            .block_on(engine.source().list_repositories(&self.owner))
            .map_err(|failure| anyhow!("Listing failed: {}", failure))?;
        let summary = listing
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| anyhow!("Repository {} not listed", name))?;

        let fp = summary.fingerprint()?;
        let key = CacheKey::repository(&self.owner, name);
        engine.cache().delete(&CacheKey::bundle(&self.owner))?;
        engine.cache().save(&key, b"\x00 definitely not json", fp)?;
        Ok(())
    }

    // ===== Time control =====

    fn handle_wait(&mut self, duration: Duration) -> Result<()> {
        self.clock.advance(duration);
        Ok(())
    }

    // ===== Process lifecycle =====

    fn handle_restart(&mut self) -> Result<()> {
        // The database must be closed before it can be reopened
        self.engine = None;
        self.engine = Some(self.open_engine()?);
        Ok(())
    }

    // ===== Assertions =====

    fn load_result(&self) -> Result<&LoadedRepositories> {
        self.last_load
            .as_ref()
            .ok_or_else(|| anyhow!("No load has run yet"))
    }

    fn query_result(&self) -> Result<&QueryOutcome> {
        self.last_query
            .as_ref()
            .ok_or_else(|| anyhow!("No query has run yet"))
    }

    fn cleanup_result(&self) -> Result<&CleanupReport> {
        self.last_cleanup
            .as_ref()
            .ok_or_else(|| anyhow!("No cleanup has run yet"))
    }

    fn cache_keys(&self) -> Result<Vec<String>> {
        Ok(self.engine()?.cache().keys_after(None, usize::MAX)?)
    }

    fn handle_assertion(&mut self, assertion: &Assertion) -> Result<()> {
        match assertion {
            Assertion::LoadedCount(n) => {
                expect_eq("loaded records", *n, self.load_result()?.records.len())
            }
            Assertion::CacheHits(n) => expect_eq("cache hits", *n, self.load_result()?.cache_hits),
            Assertion::Fetched(n) => expect_eq("fetched", *n, self.load_result()?.fetched),
            Assertion::BundleHit(expected) => {
                expect_eq("bundle hit", *expected, self.load_result()?.bundle_hit)
            }
            Assertion::FetchFailed { name, kind } => {
                let loaded = self.load_result()?;
                let failure = loaded
                    .failures
                    .get(name)
                    .ok_or_else(|| anyhow!("Expected {} to fail, failures: {:?}", name, loaded.failures))?;
                expect_eq("failure kind", *kind, failure.kind)
            }
            Assertion::TrainingChanged(names) => expect_eq(
                "training changed",
                names.clone(),
                self.load_result()?.training_changed.clone(),
            ),

            Assertion::TopRepository(name) => {
                let outcome = self.query_result()?;
                let top = outcome
                    .ranking
                    .shortlist
                    .first()
                    .map(|entry| entry.repository.clone())
                    .ok_or_else(|| anyhow!("Shortlist is empty"))?;
                expect_eq("top repository", name.clone(), top)
            }
            Assertion::RankedAbove { higher, lower } => {
                let records = &self.query_result()?.ranking.records;
                let position = |name: &str| {
                    records
                        .iter()
                        .position(|r| r.repository.ends_with(&format!("/{}", name)))
                        .ok_or_else(|| anyhow!("{} not ranked", name))
                };
                let (h, l) = (position(higher)?, position(lower)?);
                let (sh, sl) = (records[h].total_score, records[l].total_score);
                if h < l && sh > sl {
                    Ok(())
                } else {
                    Err(anyhow!(
                        "Expected {} ({:.4}) strictly above {} ({:.4})",
                        higher,
                        sh,
                        lower,
                        sl
                    ))
                }
            }
            Assertion::ShortlistLen(n) => {
                expect_eq("shortlist length", *n, self.query_result()?.ranking.shortlist.len())
            }
            Assertion::FallbackUsed(expected) => expect_eq(
                "fallback used",
                *expected,
                self.query_result()?.ranking.fallback_used,
            ),
            Assertion::NoRelevantProjects => {
                expect_eq("no relevant projects", true, self.query_result()?.no_relevant_projects)
            }
            Assertion::LanguageScoreZero(name) => {
                let score = self.language_score(name)?;
                expect_eq("language score", 0.0, score)
            }
            Assertion::LanguageScorePositive(name) => {
                let score = self.language_score(name)?;
                if score > 0.0 {
                    Ok(())
                } else {
                    Err(anyhow!("Expected positive language score for {}", name))
                }
            }

            Assertion::ContextContains(text) => {
                let context = &self.query_result()?.context.text;
                if context.contains(text.as_str()) {
                    Ok(())
                } else {
                    Err(anyhow!("Context does not contain {:?}:\n{}", text, context))
                }
            }
            Assertion::ContextNotContains(text) => {
                let context = &self.query_result()?.context.text;
                if context.contains(text.as_str()) {
                    Err(anyhow!("Context unexpectedly contains {:?}:\n{}", text, context))
                } else {
                    Ok(())
                }
            }
            Assertion::ContextWithinChars(max) => {
                let chars = self.query_result()?.context.chars;
                if chars <= *max {
                    Ok(())
                } else {
                    Err(anyhow!("Context has {} chars, budget {}", chars, max))
                }
            }
            Assertion::SectionTiers(tiers) => {
                let actual: Vec<_> = self
                    .query_result()?
                    .context
                    .sections
                    .iter()
                    .map(|s| s.tier)
                    .collect();
                expect_eq("section tiers", tiers.clone(), actual)
            }

            Assertion::CleanupInspected(n) => {
                expect_eq("inspected", *n, self.cleanup_result()?.inspected)
            }
            Assertion::CleanupDeleted(n) => expect_eq("deleted", *n, self.cleanup_result()?.deleted),
            Assertion::CleanupWouldDelete(n) => {
                expect_eq("would delete", *n, self.cleanup_result()?.would_delete)
            }
            Assertion::CleanupHasMore(expected) => expect_eq(
                "has more",
                *expected,
                self.cleanup_result()?.next_cursor.is_some(),
            ),

            Assertion::CacheEntryCount(n) => expect_eq("cache entries", *n, self.cache_keys()?.len()),
            Assertion::CacheHasKey(key) => {
                if self.cache_keys()?.contains(key) {
                    Ok(())
                } else {
                    Err(anyhow!("Cache has no entry {}", key))
                }
            }
            Assertion::CacheMissingKey(key) => {
                if self.cache_keys()?.contains(key) {
                    Err(anyhow!("Cache still has entry {}", key))
                } else {
                    Ok(())
                }
            }

            Assertion::Custom(check) => check(self.engine()?),
        }
    }

    fn language_score(&self, name: &str) -> Result<f64> {
        let full = format!("{}/{}", self.owner, name);
        self.query_result()?
            .ranking
            .record(&full)
            .map(|r| r.language_score)
            .ok_or_else(|| anyhow!("{} not ranked", full))
    }
}

fn expect_eq<T: PartialEq + std::fmt::Debug>(what: &str, expected: T, actual: T) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(anyhow!("{}: expected {:?}, got {:?}", what, expected, actual))
    }
}
