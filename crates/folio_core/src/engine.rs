//! Query pipeline: listing, cache validation, fetch fan-out, ranking and
//! context assembly.

use crate::assemble::{AssembledContext, ContextAssembler};
use crate::cache::{CacheKey, CacheStatus, CacheStore};
use crate::cleanup::{cleanup, CleanupConfig, CleanupProgressCallback, CleanupReport, LiveSnapshot};
use crate::config::Config;
use crate::error::{FolioError, Result};
use crate::fetch::{fetch_all, FetchFailure, FetchResult, RepositorySource};
use crate::fingerprint::{bundle_fingerprint, Fingerprint};
use crate::llm::{LanguageModel, LlmFailure};
use crate::rank::{Ranker, Ranking};
use crate::types::{RepositoryRecord, RepositorySummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Response text when no repository could be shortlisted.
pub const NO_RELEVANT_PROJECTS: &str = "No relevant projects found.";

/// Repositories available for scoring, with cache accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRepositories {
    /// Usable records, sorted by name.
    pub records: Vec<RepositoryRecord>,
    /// Records served from the cache.
    pub cache_hits: usize,
    /// Records fetched from the source.
    pub fetched: usize,
    /// Per-repository fetch failures; those repositories are excluded.
    pub failures: BTreeMap<String, FetchFailure>,
    /// Whether the whole owner bundle was served from the cache.
    pub bundle_hit: bool,
    /// Fetched repositories whose README, context or skills text changed
    /// since the last recorded load.
    pub training_changed: Vec<String>,
}

/// Result of one query. Always produced, whatever failed along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Scores and shortlist.
    pub ranking: Ranking,
    /// Context rendered from the shortlist.
    pub context: AssembledContext,
    /// Per-repository fetch failures.
    pub failures: BTreeMap<String, FetchFailure>,
    /// Set when the listing itself failed.
    pub listing_failure: Option<FetchFailure>,
    /// True when the shortlist is empty.
    pub no_relevant_projects: bool,
}

/// A model answer together with the query it was grounded on.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Model response, [`NO_RELEVANT_PROJECTS`], or a plain shortlist when
    /// the model failed.
    pub text: String,
    /// Pipeline outcome the answer was built from.
    pub outcome: QueryOutcome,
    /// Model failure, if the call was made and failed.
    pub llm_failure: Option<LlmFailure>,
}

/// Serializable view of a cached owner bundle.
#[derive(Serialize, Deserialize)]
struct BundlePayload {
    records: Vec<RepositoryRecord>,
}

/// Ties a repository source to the cache, the ranker and the assembler.
pub struct RelevanceEngine<S> {
    source: S,
    cache: CacheStore,
    config: Config,
    ranker: Ranker,
}

impl<S: RepositorySource> RelevanceEngine<S> {
    /// Creates an engine.
    pub fn new(source: S, cache: CacheStore, config: Config) -> Self {
        let ranker = Ranker::new(config.scoring.clone());
        Self {
            source,
            cache,
            config,
            ranker,
        }
    }

    /// Repository source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Cache store.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Ranker built from the scoring configuration.
    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    /// Loads every repository of `owner`, serving what it can from the cache.
    ///
    /// Cached entries are validated against fingerprints of the cheap listing,
    /// so unchanged repositories are never refetched. Corrupt payloads are
    /// dropped and refetched.
    ///
    /// # Errors
    ///
    /// Fails only when the listing itself fails. Per-repository failures are
    /// reported in [`LoadedRepositories::failures`].
    pub async fn load_repositories(&self, owner: &str) -> FetchResult<LoadedRepositories> {
        let summaries = self.source.list_repositories(owner).await?;
        let live = live_fingerprints(&summaries);

        let bundle = bundle_key_fingerprint(&live);
        if let Some(bundle_fp) = bundle {
            if let Some(records) = self.cached_bundle(owner, &bundle_fp) {
                info!(owner, repositories = records.len(), "bundle cache hit");
                return Ok(LoadedRepositories {
                    cache_hits: records.len(),
                    records,
                    bundle_hit: true,
                    ..LoadedRepositories::default()
                });
            }
        }

        let mut loaded = LoadedRepositories::default();
        let mut misses: Vec<String> = Vec::new();
        for (name, fp) in &live {
            let cached = fp.as_ref().and_then(|fp| self.cached_repository(owner, name, fp));
            match cached {
                Some(record) => {
                    loaded.cache_hits += 1;
                    loaded.records.push(record);
                }
                None => misses.push(name.clone()),
            }
        }

        if !misses.is_empty() {
            let batch = fetch_all(&self.source, owner, &misses, &self.config.fetch).await;
            loaded.fetched = batch.records.len();
            loaded.failures = batch.failures;
            for record in batch.records {
                if let Some(Some(fp)) = live.get(&record.name) {
                    self.store_repository(&record, *fp);
                }
                if self.record_training(&record) {
                    loaded.training_changed.push(record.name.clone());
                }
                loaded.records.push(record);
            }
        }
        loaded.records.sort_by(|a, b| a.name.cmp(&b.name));

        if let Some(bundle_fp) = bundle {
            if loaded.failures.is_empty() {
                self.store_bundle(owner, &loaded.records, bundle_fp);
            }
        }

        info!(
            owner,
            hits = loaded.cache_hits,
            fetched = loaded.fetched,
            failed = loaded.failures.len(),
            "loaded repositories"
        );
        Ok(loaded)
    }

    /// Ranks `owner`'s repositories against `query` and assembles context.
    ///
    /// Total: a failed listing or an empty repository set yields an empty
    /// shortlist with `no_relevant_projects` set.
    pub async fn query(&self, owner: &str, query: &str) -> QueryOutcome {
        self.query_with_ceiling(owner, query, None).await
    }

    async fn query_with_ceiling(
        &self,
        owner: &str,
        query: &str,
        max_input_chars: Option<usize>,
    ) -> QueryOutcome {
        let (loaded, listing_failure) = match self.load_repositories(owner).await {
            Ok(loaded) => (loaded, None),
            Err(failure) => {
                warn!(owner, %failure, "repository listing failed");
                (LoadedRepositories::default(), Some(failure))
            }
        };

        let ranking = self.ranker.rank(&loaded.records, query);
        let context = ContextAssembler::new(self.config.context.clone())
            .with_input_ceiling(max_input_chars)
            .assemble(&ranking.shortlist, &loaded.records, ranking.fallback_used);
        let no_relevant_projects = ranking.shortlist.is_empty();

        QueryOutcome {
            ranking,
            context,
            failures: loaded.failures,
            listing_failure,
            no_relevant_projects,
        }
    }

    /// Answers `query` with `model`, grounded on the assembled context.
    ///
    /// The model is not called when nothing was shortlisted.
    pub async fn answer(&self, model: &dyn LanguageModel, owner: &str, query: &str) -> Answer {
        let outcome = self
            .query_with_ceiling(owner, query, model.max_input_chars())
            .await;
        if outcome.no_relevant_projects {
            return Answer {
                text: NO_RELEVANT_PROJECTS.to_string(),
                outcome,
                llm_failure: None,
            };
        }

        match model.complete(&outcome.context.text, query).await {
            Ok(text) => Answer {
                text,
                outcome,
                llm_failure: None,
            },
            Err(failure) => {
                warn!(%failure, "language model failed");
                let names: Vec<&str> = outcome
                    .ranking
                    .shortlist
                    .iter()
                    .map(|e| e.repository.as_str())
                    .collect();
                Answer {
                    text: format!("Most relevant projects: {}", names.join(", ")),
                    outcome,
                    llm_failure: Some(failure),
                }
            }
        }
    }

    /// Removes cache entries for repositories `owner` no longer has.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::SourceUnavailable`] when the listing fails, since
    /// nothing can be judged gone without it.
    pub async fn cleanup(
        &self,
        owner: &str,
        config: &CleanupConfig,
        progress: Option<&CleanupProgressCallback<'_>>,
    ) -> Result<CleanupReport> {
        let summaries = self
            .source
            .list_repositories(owner)
            .await
            .map_err(|e| FolioError::SourceUnavailable(e.to_string()))?;
        let live = live_fingerprints(&summaries);

        let mut snapshot = LiveSnapshot::new(owner);
        for (name, fp) in &live {
            match fp {
                Some(fp) => snapshot.insert(CacheKey::repository(owner, name), *fp),
                None => snapshot.insert_listed(CacheKey::repository(owner, name)),
            }
            snapshot.insert_listed(CacheKey::training(owner, name));
        }
        if let Some(bundle_fp) = bundle_key_fingerprint(&live) {
            snapshot.insert(CacheKey::bundle(owner), bundle_fp);
        }

        cleanup(&self.cache, &snapshot, config, progress)
    }

    fn cached_bundle(&self, owner: &str, fp: &Fingerprint) -> Option<Vec<RepositoryRecord>> {
        let key = CacheKey::bundle(owner);
        let entry = self.cache.get(&key, fp);
        let payload = entry.valid_payload()?;
        match serde_json::from_slice::<BundlePayload>(payload) {
            Ok(bundle) => Some(bundle.records),
            Err(e) => {
                warn!(%key, error = %e, "undecodable bundle payload, dropping");
                self.drop_entry(&key);
                None
            }
        }
    }

    fn cached_repository(
        &self,
        owner: &str,
        name: &str,
        fp: &Fingerprint,
    ) -> Option<RepositoryRecord> {
        let key = CacheKey::repository(owner, name);
        let entry = self.cache.get(&key, fp);
        match entry.status {
            CacheStatus::Valid => {}
            CacheStatus::Stale => {
                debug!(%key, "stale cache entry");
                return None;
            }
            status => {
                debug!(%key, %status, "cache miss");
                return None;
            }
        }

        let payload = entry.valid_payload()?;
        match serde_json::from_slice::<RepositoryRecord>(payload) {
            Ok(record) if record.owner == owner && record.name == name => Some(record),
            Ok(record) => {
                warn!(%key, got = %record.full_name(), "cached record has wrong identity, dropping");
                self.drop_entry(&key);
                None
            }
            Err(e) => {
                warn!(%key, error = %e, "undecodable cached record, dropping");
                self.drop_entry(&key);
                None
            }
        }
    }

    fn store_repository(&self, record: &RepositoryRecord, fp: Fingerprint) {
        let key = CacheKey::repository(&record.owner, &record.name);
        match serde_json::to_vec(record) {
            Ok(payload) => self.save_entry(&key, &payload, fp),
            Err(e) => warn!(%key, error = %e, "failed to encode record for cache"),
        }
    }

    fn store_bundle(&self, owner: &str, records: &[RepositoryRecord], fp: Fingerprint) {
        let key = CacheKey::bundle(owner);
        let bundle = BundlePayload {
            records: records.to_vec(),
        };
        match serde_json::to_vec(&bundle) {
            Ok(payload) => self.save_entry(&key, &payload, fp),
            Err(e) => warn!(%key, error = %e, "failed to encode bundle for cache"),
        }
    }

    /// Records the training fingerprint of `record`; true when it changed.
    fn record_training(&self, record: &RepositoryRecord) -> bool {
        if !self.cache.is_enabled() {
            return false;
        }
        let key = CacheKey::training(&record.owner, &record.name);
        let fp = match record.training_fingerprint() {
            Ok(fp) => fp,
            Err(e) => {
                warn!(%key, error = %e, "failed to compute training fingerprint");
                return false;
            }
        };
        match self.cache.get(&key, &fp).status {
            CacheStatus::Valid => false,
            CacheStatus::Missing | CacheStatus::Stale => {
                self.save_entry(&key, &[], fp);
                true
            }
            CacheStatus::Disabled | CacheStatus::Error => false,
        }
    }

    fn save_entry(&self, key: &CacheKey, payload: &[u8], fp: Fingerprint) {
        if !self.cache.is_enabled() {
            return;
        }
        if let Err(e) = self.cache.save(key, payload, fp) {
            warn!(%key, error = %e, "failed to save cache entry");
        }
    }

    fn drop_entry(&self, key: &CacheKey) {
        if let Err(e) = self.cache.delete(key) {
            warn!(%key, error = %e, "failed to delete cache entry");
        }
    }
}

/// Listing fingerprints by repository name. `None` where one can't be
/// computed; such repositories are always fetched and never cached.
fn live_fingerprints(summaries: &[RepositorySummary]) -> BTreeMap<String, Option<Fingerprint>> {
    summaries
        .iter()
        .map(|summary| {
            let fp = match summary.fingerprint() {
                Ok(fp) => Some(fp),
                Err(e) => {
                    warn!(repository = %summary.name, error = %e, "failed to fingerprint listing");
                    None
                }
            };
            (summary.name.clone(), fp)
        })
        .collect()
}

/// Bundle fingerprint, defined only when every listing fingerprint is.
fn bundle_key_fingerprint(live: &BTreeMap<String, Option<Fingerprint>>) -> Option<Fingerprint> {
    let all: Option<Vec<Fingerprint>> = live.values().copied().collect();
    all.map(bundle_fingerprint)
}
