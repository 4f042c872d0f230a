//! Error types for folio_core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for folio_core operations.
///
/// Failures that are local to a single repository (fetch errors, malformed
/// context documents) are absorbed where they happen and never surface here.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Invalid hex string for Fingerprint parsing.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    /// Cache key does not follow the `{domain}:{owner}:{identifier}` pattern.
    #[error("invalid cache key: {0}")]
    InvalidCacheKey(String),

    /// Serialization error while canonicalizing or storing a value.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error while reading a stored value.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(String),

    /// The cache database could not be opened, read or written.
    #[error("cache database error: {0}")]
    Database(String),

    /// The cache database was written by an incompatible schema.
    #[error("cache schema version mismatch: found {found}, expected {expected}")]
    SchemaMismatch {
        /// Version found on disk
        found: u32,
        /// Version this build understands
        expected: u32,
    },

    /// A stored cache entry could not be decoded.
    #[error("corrupted cache entry {key}: {reason}")]
    CorruptedEntry {
        /// Cache key of the entry
        key: String,
        /// Description of the corruption
        reason: String,
    },

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Workspace directory is missing or malformed.
    #[error("not a folio workspace: {}", path.display())]
    NotAWorkspace {
        /// Path that was expected to contain `.folio`
        path: PathBuf,
    },

    /// The repository source could not be listed at all.
    #[error("repository source unavailable: {0}")]
    SourceUnavailable(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FolioError {
    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::SchemaMismatch { .. } | Self::Database(_) => {
                Some("The cache is rebuildable. Delete .folio/cache and run the query again.")
            }
            Self::CorruptedEntry { .. } => {
                Some("Run 'folio cache delete <key>' or 'folio cache cleanup <owner>' to drop it.")
            }
            Self::NotAWorkspace { .. } => Some("Run 'folio init' to create a workspace."),
            Self::ConfigError(_) => Some("Check .folio/config.toml for typos or remove it to use defaults."),
            Self::InvalidCacheKey(_) => Some("Cache keys look like 'repo:<owner>:<name>'."),
            _ => None,
        }
    }
}

/// Convenience Result type for folio_core operations.
pub type Result<T> = std::result::Result<T, FolioError>;
