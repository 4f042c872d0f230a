//! Fingerprint-validated cache store.
//!
//! Entries never expire. An entry is served only when its stored fingerprint
//! equals the fingerprint the caller computed from live inputs; anything else
//! is reported as stale and the caller refetches and saves again.
//!
//! Layout: one redb table mapping the rendered [`CacheKey`] to a postcard
//! encoded envelope holding the fingerprint, the zstd-compressed payload and a
//! diagnostic timestamp. Every write is a single redb transaction, so
//! concurrent writers to one key cannot tear an entry; the last commit wins.

use crate::config::CacheConfig;
use crate::error::{FolioError, Result};
use crate::fingerprint::Fingerprint;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Cache schema version for migration support.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

const METADATA_TABLE: TableDefinition<&str, u32> = TableDefinition::new("metadata");
const ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// What a cache entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDomain {
    /// One repository's fetched record.
    Repository,
    /// The list of repositories making up one owner's bundle.
    Bundle,
    /// Training-style text (README, context, skills) of one repository.
    Training,
}

impl CacheDomain {
    /// Prefix used in rendered keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheDomain::Repository => "repo",
            CacheDomain::Bundle => "bundle",
            CacheDomain::Training => "training",
        }
    }
}

impl FromStr for CacheDomain {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "repo" => Ok(CacheDomain::Repository),
            "bundle" => Ok(CacheDomain::Bundle),
            "training" => Ok(CacheDomain::Training),
            other => Err(FolioError::InvalidCacheKey(format!("unknown domain '{}'", other))),
        }
    }
}

/// Cache key, rendered as `{domain}:{owner}:{identifier}`.
///
/// # Examples
///
/// ```
/// use folio_core::CacheKey;
///
/// let key = CacheKey::repository("ada", "engine");
/// assert_eq!(key.to_string(), "repo:ada:engine");
/// assert_eq!("repo:ada:engine".parse::<CacheKey>().unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    /// Entry kind.
    pub domain: CacheDomain,
    /// Owning user or organization.
    pub owner: String,
    /// Repository name, or `all` for bundles.
    pub identifier: String,
}

/// Identifier used for per-owner bundle keys.
pub const BUNDLE_IDENTIFIER: &str = "all";

impl CacheKey {
    /// Key of one repository's record.
    pub fn repository(owner: &str, name: &str) -> Self {
        Self {
            domain: CacheDomain::Repository,
            owner: owner.to_string(),
            identifier: name.to_string(),
        }
    }

    /// Key of an owner's aggregate bundle.
    pub fn bundle(owner: &str) -> Self {
        Self {
            domain: CacheDomain::Bundle,
            owner: owner.to_string(),
            identifier: BUNDLE_IDENTIFIER.to_string(),
        }
    }

    /// Key of one repository's training text.
    pub fn training(owner: &str, name: &str) -> Self {
        Self {
            domain: CacheDomain::Training,
            owner: owner.to_string(),
            identifier: name.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.domain.as_str(), self.owner, self.identifier)
    }
}

impl FromStr for CacheKey {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let (Some(domain), Some(owner), Some(identifier)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(FolioError::InvalidCacheKey(s.to_string()));
        };
        if owner.is_empty() || identifier.is_empty() {
            return Err(FolioError::InvalidCacheKey(s.to_string()));
        }
        Ok(Self {
            domain: domain.parse()?,
            owner: owner.to_string(),
            identifier: identifier.to_string(),
        })
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum CacheStatus {
    /// Stored fingerprint equals the live one; payload attached.
    Valid = 0,
    /// No entry (or a corrupt entry that was just dropped).
    Missing = 1,
    /// Stored fingerprint differs from the live one; payload withheld.
    Stale = 2,
    /// The store is turned off.
    Disabled = 3,
    /// The store could not be read.
    Error = 4,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheStatus::Valid => "valid",
            CacheStatus::Missing => "missing",
            CacheStatus::Stale => "stale",
            CacheStatus::Disabled => "disabled",
            CacheStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// A cache lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Rendered key.
    pub key: String,
    /// Stored fingerprint, when an entry exists.
    pub fingerprint: Option<Fingerprint>,
    /// Decompressed payload, only for [`CacheStatus::Valid`].
    pub payload: Option<Vec<u8>>,
    /// Lookup outcome.
    pub status: CacheStatus,
}

impl CacheEntry {
    fn empty(key: &CacheKey, status: CacheStatus) -> Self {
        Self {
            key: key.to_string(),
            fingerprint: None,
            payload: None,
            status,
        }
    }

    /// Payload if the entry is valid.
    pub fn valid_payload(&self) -> Option<&[u8]> {
        match self.status {
            CacheStatus::Valid => self.payload.as_deref(),
            _ => None,
        }
    }
}

/// Envelope persisted per key.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    fingerprint: Fingerprint,
    /// zstd-compressed payload.
    payload: Vec<u8>,
    /// Unix seconds at write time. Diagnostic only, never used for validity.
    stored_at: i64,
}

/// Aggregate numbers for `folio cache stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total entries.
    pub entries: u64,
    /// Compressed payload bytes across all entries.
    pub payload_bytes: u64,
    /// Entries per key domain prefix.
    pub by_domain: BTreeMap<String, u64>,
    /// Entries whose envelope could not be decoded.
    pub corrupt: u64,
}

struct Backend {
    db: Database,
    path: PathBuf,
}

/// Persistent key/value store validated by fingerprint.
pub struct CacheStore {
    backend: Option<Backend>,
    compression_level: i32,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("path", &self.path())
            .field("compression_level", &self.compression_level)
            .finish()
    }
}

impl CacheStore {
    /// Opens or creates the store at `path`.
    ///
    /// A disabled configuration yields a store whose lookups all report
    /// [`CacheStatus::Disabled`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database can't be created or was written by
    /// an incompatible schema version.
    pub fn open(path: impl AsRef<Path>, config: &CacheConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }

        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path)
            .map_err(|e| FolioError::Database(format!("failed to open cache: {}", e)))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| FolioError::Database(format!("failed to begin write transaction: {}", e)))?;
        {
            let mut meta = write_txn
                .open_table(METADATA_TABLE)
                .map_err(|e| FolioError::Database(format!("failed to open metadata table: {}", e)))?;
            let found = meta
                .get("version")
                .map_err(|e| FolioError::Database(format!("failed to read version: {}", e)))?
                .map(|v| v.value());
            match found {
                Some(version) if version != CACHE_SCHEMA_VERSION => {
                    return Err(FolioError::SchemaMismatch {
                        found: version,
                        expected: CACHE_SCHEMA_VERSION,
                    });
                }
                Some(_) => {}
                None => {
                    meta.insert("version", CACHE_SCHEMA_VERSION).map_err(|e| {
                        FolioError::Database(format!("failed to insert version: {}", e))
                    })?;
                }
            }

            write_txn
                .open_table(ENTRIES_TABLE)
                .map_err(|e| FolioError::Database(format!("failed to open entries table: {}", e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| FolioError::Database(format!("failed to commit: {}", e)))?;

        debug!(path = %path.display(), "opened cache store");
        Ok(Self {
            backend: Some(Backend { db, path }),
            compression_level: config.compression_level,
        })
    }

    /// A store that caches nothing.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            compression_level: CacheConfig::default().compression_level,
        }
    }

    /// Whether lookups can ever be valid.
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Path of the database file, if enabled.
    pub fn path(&self) -> Option<&Path> {
        self.backend.as_ref().map(|b| b.path.as_path())
    }

    /// Looks up `key` and validates it against the live fingerprint.
    ///
    /// Never fails: read errors surface as [`CacheStatus::Error`], and an
    /// entry that cannot be decoded is deleted and reported as
    /// [`CacheStatus::Missing`] so the caller refetches.
    pub fn get(&self, key: &CacheKey, current: &Fingerprint) -> CacheEntry {
        if self.backend.is_none() {
            return CacheEntry::empty(key, CacheStatus::Disabled);
        }

        let raw = match self.read_raw(&key.to_string()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(%key, "cache miss");
                return CacheEntry::empty(key, CacheStatus::Missing);
            }
            Err(e) => {
                warn!(%key, error = %e, "cache read failed");
                return CacheEntry::empty(key, CacheStatus::Error);
            }
        };

        let stored = match decode_envelope(key, &raw) {
            Ok(stored) => stored,
            Err(e) => return self.drop_corrupt(key, e),
        };

        if stored.fingerprint != *current {
            debug!(
                %key,
                stored = %stored.fingerprint.short(),
                live = %current.short(),
                "cache entry stale"
            );
            return CacheEntry {
                key: key.to_string(),
                fingerprint: Some(stored.fingerprint),
                payload: None,
                status: CacheStatus::Stale,
            };
        }

        match zstd::decode_all(stored.payload.as_slice()) {
            Ok(payload) => {
                debug!(%key, "cache hit");
                CacheEntry {
                    key: key.to_string(),
                    fingerprint: Some(stored.fingerprint),
                    payload: Some(payload),
                    status: CacheStatus::Valid,
                }
            }
            Err(e) => self.drop_corrupt(
                key,
                FolioError::CorruptedEntry {
                    key: key.to_string(),
                    reason: format!("decompression failed: {}", e),
                },
            ),
        }
    }

    /// Stores `payload` under `key`, replacing any previous entry.
    ///
    /// A no-op on a disabled store.
    pub fn save(&self, key: &CacheKey, payload: &[u8], fingerprint: Fingerprint) -> Result<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };

        let compressed = zstd::encode_all(payload, self.compression_level)
            .map_err(|e| FolioError::Compression(e.to_string()))?;
        let envelope = StoredEntry {
            fingerprint,
            payload: compressed,
            stored_at: unix_now(),
        };
        let bytes = postcard::to_allocvec(&envelope)
            .map_err(|e| FolioError::Serialization(e.to_string()))?;

        let rendered = key.to_string();
        let write_txn = begin_write(&backend.db)?;
        {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .map_err(|e| FolioError::Database(format!("failed to open entries table: {}", e)))?;
            table
                .insert(rendered.as_str(), bytes.as_slice())
                .map_err(|e| FolioError::Database(format!("failed to insert entry: {}", e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| FolioError::Database(format!("failed to commit: {}", e)))?;

        debug!(%key, fingerprint = %fingerprint.short(), bytes = bytes.len(), "cache entry saved");
        Ok(())
    }

    /// Removes `key`. Returns whether an entry existed.
    pub fn delete(&self, key: &CacheKey) -> Result<bool> {
        self.delete_raw(&key.to_string())
    }

    /// Removes an entry by its rendered key, even if the key does not parse.
    pub fn delete_raw(&self, key: &str) -> Result<bool> {
        let Some(backend) = &self.backend else {
            return Ok(false);
        };

        let write_txn = begin_write(&backend.db)?;
        let existed = {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .map_err(|e| FolioError::Database(format!("failed to open entries table: {}", e)))?;
            let removed = table
                .remove(key)
                .map_err(|e| FolioError::Database(format!("failed to remove entry: {}", e)))?;
            removed.is_some()
        };
        write_txn
            .commit()
            .map_err(|e| FolioError::Database(format!("failed to commit: {}", e)))?;
        Ok(existed)
    }

    /// Up to `limit` rendered keys strictly after `start_after`, in key order.
    pub fn keys_after(&self, start_after: Option<&str>, limit: usize) -> Result<Vec<String>> {
        let Some(backend) = &self.backend else {
            return Ok(Vec::new());
        };

        let read_txn = begin_read(&backend.db)?;
        let table = read_txn
            .open_table(ENTRIES_TABLE)
            .map_err(|e| FolioError::Database(format!("failed to open entries table: {}", e)))?;

        let lower = match start_after {
            Some(cursor) => Bound::Excluded(cursor),
            None => Bound::Unbounded,
        };
        let range = table
            .range::<&str>((lower, Bound::Unbounded))
            .map_err(|e| FolioError::Database(format!("failed to scan entries: {}", e)))?;

        let mut keys = Vec::new();
        for item in range.take(limit) {
            let (key, _) =
                item.map_err(|e| FolioError::Database(format!("failed to read entry: {}", e)))?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    /// Fingerprint stored under `key`, without validating it.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::CorruptedEntry` if the envelope cannot be decoded.
    pub fn stored_fingerprint(&self, key: &CacheKey) -> Result<Option<Fingerprint>> {
        match self.read_raw(&key.to_string())? {
            Some(raw) => Ok(Some(decode_envelope(key, &raw)?.fingerprint)),
            None => Ok(None),
        }
    }

    /// Entry counts and sizes.
    pub fn stats(&self) -> Result<CacheStats> {
        let Some(backend) = &self.backend else {
            return Ok(CacheStats::default());
        };

        let read_txn = begin_read(&backend.db)?;
        let table = read_txn
            .open_table(ENTRIES_TABLE)
            .map_err(|e| FolioError::Database(format!("failed to open entries table: {}", e)))?;

        let mut stats = CacheStats {
            entries: table
                .len()
                .map_err(|e| FolioError::Database(format!("failed to count entries: {}", e)))?,
            ..CacheStats::default()
        };

        for item in table
            .iter()
            .map_err(|e| FolioError::Database(format!("failed to scan entries: {}", e)))?
        {
            let (key, value) =
                item.map_err(|e| FolioError::Database(format!("failed to read entry: {}", e)))?;
            let domain = key.value().split(':').next().unwrap_or_default().to_string();
            *stats.by_domain.entry(domain).or_default() += 1;

            match postcard::from_bytes::<StoredEntry>(value.value()) {
                Ok(stored) => stats.payload_bytes += stored.payload.len() as u64,
                Err(_) => stats.corrupt += 1,
            }
        }
        Ok(stats)
    }

    fn read_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(backend) = &self.backend else {
            return Ok(None);
        };

        let read_txn = begin_read(&backend.db)?;
        let table = read_txn
            .open_table(ENTRIES_TABLE)
            .map_err(|e| FolioError::Database(format!("failed to open entries table: {}", e)))?;
        let value = table
            .get(key)
            .map_err(|e| FolioError::Database(format!("failed to get entry: {}", e)))?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn drop_corrupt(&self, key: &CacheKey, error: FolioError) -> CacheEntry {
        warn!(%key, error = %error, "dropping corrupt cache entry");
        if let Err(e) = self.delete(key) {
            warn!(%key, error = %e, "failed to delete corrupt cache entry");
        }
        CacheEntry::empty(key, CacheStatus::Missing)
    }

    #[cfg(test)]
    pub(crate) fn put_raw(&self, key: &str, bytes: &[u8]) {
        let backend = self.backend.as_ref().unwrap();
        let txn = backend.db.begin_write().unwrap();
        {
            let mut table = txn.open_table(ENTRIES_TABLE).unwrap();
            table.insert(key, bytes).unwrap();
        }
        txn.commit().unwrap();
    }
}

fn decode_envelope(key: &CacheKey, raw: &[u8]) -> Result<StoredEntry> {
    postcard::from_bytes(raw).map_err(|e| FolioError::CorruptedEntry {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn begin_read(db: &Database) -> Result<redb::ReadTransaction> {
    db.begin_read()
        .map_err(|e| FolioError::Database(format!("failed to begin read transaction: {}", e)))
}

fn begin_write(db: &Database) -> Result<redb::WriteTransaction> {
    db.begin_write()
        .map_err(|e| FolioError::Database(format!("failed to begin write transaction: {}", e)))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
