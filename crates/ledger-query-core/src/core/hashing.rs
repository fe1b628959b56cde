// crates/ledger-query-core/src/core/hashing.rs
// ============================================================================
// Module: Ledger Query Hashing
// Description: Canonical hashing for transactions, blocks, and query correlation.
// Purpose: Provide deterministic digests with stable hex wire forms.
// Dependencies: serde, serde_jcs, serde_json, sha2
// ============================================================================

//! ## Overview
//! Hashing is used for transaction identity, block integrity verification,
//! and query correlation. Digests are computed over canonical JSON bytes
//! (JCS) so that logically equal values hash identically regardless of field
//! order.
//!
//! Security posture: digests loaded from storage are untrusted until
//! re-verified against recomputed hashes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Algorithm
// ============================================================================

/// Default hash algorithm for all ledger digests.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Supported hash algorithms.
///
/// # Invariants
/// - Variants are stable for serialization and storage labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the stable storage label for the algorithm.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sha256 => "sha-256",
        }
    }
}

/// Hashing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum HashError {
    /// Canonicalization of the input value failed.
    #[error("canonical json error: {0}")]
    Canonical(String),
}

// ============================================================================
// SECTION: Digests
// ============================================================================

/// Hash digest rendered as lowercase hex.
///
/// # Invariants
/// - Opaque hex string; comparison is byte-wise on the hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashDigest(String);

impl HashDigest {
    /// Creates a digest from a hex string.
    #[must_use]
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Transaction hash identifying a committed or pending transaction.
///
/// # Invariants
/// - Opaque digest; equality identifies the same transaction body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(HashDigest);

impl TxHash {
    /// Creates a transaction hash from a hex string.
    #[must_use]
    pub fn new(hex: impl Into<String>) -> Self {
        Self(HashDigest::new(hex))
    }

    /// Returns the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<HashDigest> for TxHash {
    fn from(digest: HashDigest) -> Self {
        Self(digest)
    }
}

/// Correlation hash tagging a single query invocation for diagnostics.
///
/// # Invariants
/// - Opaque digest; the engine never interprets its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryHash(HashDigest);

impl QueryHash {
    /// Creates a query hash from a hex string.
    #[must_use]
    pub fn new(hex: impl Into<String>) -> Self {
        Self(HashDigest::new(hex))
    }

    /// Returns the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for QueryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Hash Functions
// ============================================================================

/// Serializes a value into canonical JSON (JCS) bytes.
///
/// # Errors
///
/// Returns [`HashError`] when the value cannot be canonicalized.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonical(err.to_string()))
}

/// Hashes raw bytes with the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(bytes);
            let mut hex = String::with_capacity(digest.len() * 2);
            for byte in digest {
                hex.push(hex_digit(byte >> 4));
                hex.push(hex_digit(byte & 0x0f));
            }
            HashDigest(hex)
        }
    }
}

/// Returns the lowercase hex digit for a nibble.
const fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'a' + (nibble - 10)) as char,
    }
}
