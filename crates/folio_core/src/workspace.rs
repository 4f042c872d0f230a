//! Workspace handle: the `.folio` directory with config, cache and records.

use crate::cache::CacheStore;
use crate::config::Config;
use crate::engine::RelevanceEngine;
use crate::error::{FolioError, Result};
use crate::source::DirectorySource;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the workspace directory.
pub const FOLIO_DIR: &str = ".folio";

/// Folio workspace handle.
///
/// Layout:
///
/// ```text
/// .folio/
///   config.toml
///   cache/cache.redb
///   repos/<owner>/<name>.json
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory containing `.folio`.
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::NotAWorkspace`] if `.folio` is missing, or a
    /// configuration error if `config.toml` is invalid.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use folio_core::Workspace;
    ///
    /// let workspace = Workspace::open(".").unwrap();
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let folio_dir = root.join(FOLIO_DIR);
        if !folio_dir.is_dir() {
            return Err(FolioError::NotAWorkspace { path: root });
        }
        let config = Config::load(&folio_dir)?;
        Ok(Self { root, config })
    }

    /// Creates a workspace with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `.folio` already exists or can't be created.
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let folio_dir = root.join(FOLIO_DIR);
        if folio_dir.exists() {
            return Err(FolioError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "folio workspace already exists in this directory",
            )));
        }

        let config = Config::default();
        fs::create_dir_all(folio_dir.join("cache"))?;
        fs::create_dir_all(folio_dir.join(&config.source.path))?;
        config.save(&folio_dir)?;
        Ok(Self { root, config })
    }

    /// Directory containing `.folio`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.folio` directory.
    pub fn folio_dir(&self) -> PathBuf {
        self.root.join(FOLIO_DIR)
    }

    /// Loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Location of the cache database.
    pub fn cache_path(&self) -> PathBuf {
        self.folio_dir().join("cache").join("cache.redb")
    }

    /// Root of the on-disk repository records.
    pub fn source_dir(&self) -> PathBuf {
        // join() keeps an absolute configured path as is
        self.folio_dir().join(&self.config.source.path)
    }

    /// Opens the cache store.
    pub fn open_cache(&self) -> Result<CacheStore> {
        CacheStore::open(self.cache_path(), &self.config.cache)
    }

    /// Builds an engine over the workspace's records and cache.
    pub fn engine(&self) -> Result<RelevanceEngine<DirectorySource>> {
        Ok(RelevanceEngine::new(
            DirectorySource::new(self.source_dir()),
            self.open_cache()?,
            self.config.clone(),
        ))
    }
}
