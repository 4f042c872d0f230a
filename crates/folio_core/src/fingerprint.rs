//! Content fingerprints and the canonical envelope they are computed over.

use crate::error::{FolioError, Result};
use crate::types::{RepositoryRecord, RepositorySummary};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte BLAKE3 digest used for change detection.
///
/// Two fingerprints are equal iff the canonical serialization of their inputs
/// is byte-for-byte equal. Fingerprints are not an integrity mechanism against
/// adversaries; they only tell the cache whether its inputs moved.
///
/// # Examples
///
/// ```
/// use folio_core::Fingerprint;
///
/// let fp = Fingerprint::from_bytes([0xab; 32]);
/// assert_eq!(fp.as_hex().len(), 64);
/// assert_eq!(fp.short(), "abababababab");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// The length of a Fingerprint in bytes.
    pub const LEN: usize = 32;

    /// The length of a Fingerprint as a hex string.
    pub const HEX_LEN: usize = 64;

    /// Creates a Fingerprint from raw bytes.
    #[inline]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying digest.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns this Fingerprint as a lowercase hex string (64 characters).
    pub fn as_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, for logs and tables.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }

    /// Parses a Fingerprint from a hex string.
    ///
    /// # Errors
    ///
    /// Returns `FolioError::InvalidHex` if the string is not valid hex
    /// or is not exactly 64 characters long.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != Self::HEX_LEN {
            return Err(FolioError::InvalidHex(format!(
                "expected {} hex chars, got {}",
                Self::HEX_LEN,
                s.len()
            )));
        }

        let bytes = hex::decode(s).map_err(|e| FolioError::InvalidHex(e.to_string()))?;

        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| FolioError::InvalidHex("invalid length".to_string()))?;

        Ok(Self(arr))
    }

    /// Hashes an already-canonical payload under the given kind.
    pub(crate) fn hash_payload(kind: FingerprintKind, payload: &[u8]) -> Self {
        let canonical = canonical_bytes(kind, payload);
        Self(*blake3::hash(&canonical).as_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}...)", self.short())
    }
}

/// Kind discriminant for the canonical envelope.
///
/// Keeps a bundle digest from ever colliding with a content digest of the
/// same bytes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FingerprintKind {
    /// A single serialized value (repository listing or content).
    Content = 1,
    /// An aggregate over per-repository fingerprints.
    Bundle = 2,
    /// README / context / skills text.
    Training = 3,
}

/// Canonical envelope magic bytes.
pub(crate) const MAGIC: &[u8; 5] = b"FLIO1";

/// Constructs canonical bytes for hashing.
///
/// Format:
/// - Magic: "FLIO1" (5 bytes)
/// - Kind: u8 (1 byte)
/// - Length: u64 LE (8 bytes)
/// - Payload: variable bytes
pub(crate) fn canonical_bytes(kind: FingerprintKind, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(5 + 1 + 8 + payload.len());
    out.extend_from_slice(MAGIC);
    out.push(kind as u8);
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Serializes a value with stable map-key ordering.
///
/// Going through `serde_json::Value` sorts object keys, so a `HashMap` and a
/// `BTreeMap` holding the same pairs canonicalize identically.
pub fn canonical_json<T: Serialize + ?Sized>(content: &T) -> Result<Vec<u8>> {
    let value =
        serde_json::to_value(content).map_err(|e| FolioError::Serialization(e.to_string()))?;
    serde_json::to_vec(&value).map_err(|e| FolioError::Serialization(e.to_string()))
}

/// Computes the content fingerprint of any serializable value.
///
/// # Examples
///
/// ```
/// use folio_core::fingerprint;
/// use std::collections::HashMap;
///
/// let mut a = HashMap::new();
/// a.insert("Rust", 10);
/// a.insert("C", 5);
/// let mut b = HashMap::new();
/// b.insert("C", 5);
/// b.insert("Rust", 10);
///
/// assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
/// ```
pub fn fingerprint<T: Serialize + ?Sized>(content: &T) -> Result<Fingerprint> {
    let canonical = canonical_json(content)?;
    Ok(Fingerprint::hash_payload(FingerprintKind::Content, &canonical))
}

/// Composes per-repository fingerprints into one aggregate digest.
///
/// The input is treated as a set: order and duplicates do not matter.
pub fn bundle_fingerprint<I>(fingerprints: I) -> Fingerprint
where
    I: IntoIterator<Item = Fingerprint>,
{
    let mut all: Vec<Fingerprint> = fingerprints.into_iter().collect();
    all.sort();
    all.dedup();

    let mut payload = Vec::with_capacity(all.len() * Fingerprint::LEN);
    for fp in &all {
        payload.extend_from_slice(fp.as_bytes());
    }
    Fingerprint::hash_payload(FingerprintKind::Bundle, &payload)
}

/// Fingerprint over the text a downstream model is shown about a repository.
///
/// Changes whenever the README, the structured context document or the
/// skills index changes, and never otherwise.
pub fn training_fingerprint(
    readme: Option<&str>,
    context: Option<&serde_json::Value>,
    skills: Option<&str>,
) -> Result<Fingerprint> {
    #[derive(Serialize)]
    struct TrainingInput<'a> {
        readme: Option<&'a str>,
        context: Option<&'a serde_json::Value>,
        skills: Option<&'a str>,
    }

    let canonical = canonical_json(&TrainingInput {
        readme,
        context,
        skills,
    })?;
    Ok(Fingerprint::hash_payload(FingerprintKind::Training, &canonical))
}

impl RepositorySummary {
    /// Live fingerprint used to validate cached repository bundles.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        fingerprint(self)
    }
}

impl RepositoryRecord {
    /// Fingerprint over the full fetched content of this repository.
    pub fn content_fingerprint(&self) -> Result<Fingerprint> {
        fingerprint(self)
    }

    /// Fingerprint over README, context document and skills index.
    pub fn training_fingerprint(&self) -> Result<Fingerprint> {
        training_fingerprint(
            self.readme.as_deref(),
            self.context.as_ref(),
            self.skills_index.as_deref(),
        )
    }
}
