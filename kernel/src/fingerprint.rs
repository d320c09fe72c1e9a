//! Content hashing and state fingerprints.
//!
//! **Exactly one place defines state fingerprinting.** Search graphs key their
//! nodes by [`StateFingerprint`], which is always produced by [`fingerprint`]
//! from an agent's `dump()` string.
//!
//! Algorithm: SHA-256 with a null-terminated domain prefix.

use sha2::{Digest, Sha256};

use crate::agent::LoopAgentV1;

/// Domain prefix for agent state fingerprints.
pub const DOMAIN_AGENT_STATE: &[u8] = b"LOOPTUNE::AGENT_STATE::V1\0";

/// Domain prefix for digests of model files loaded by evaluators.
pub const DOMAIN_MODEL_FILE: &[u8] = b"LOOPTUNE::MODEL_FILE::V1\0";

/// A content-addressed hash with algorithm identifier.
///
/// Format: `"algorithm:hex_digest"` (e.g., `"sha256:abcdef..."`)
///
/// Only [`canonical_hash`] constructs one, so the algorithm is always
/// `sha256` and the digest is 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    full: String,
    colon: usize,
}

impl ContentHash {
    /// The algorithm portion (e.g., "sha256").
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.full[..self.colon]
    }

    /// The hex digest portion.
    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.full[self.colon + 1..]
    }

    /// The full string representation (`"algorithm:hex_digest"`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// Compute the canonical hash of a byte slice with domain separation.
///
/// Result format: `"sha256:<hex_digest>"`.
#[must_use]
pub fn canonical_hash(domain: &[u8], data: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    let digest = hasher.finalize();
    let full = format!("sha256:{}", hex::encode(digest));
    ContentHash { full, colon: 6 }
}

/// Graph key for a visited agent state.
///
/// A pure function of the agent's serialized form: two agents with the same
/// `dump()` always produce the same fingerprint. Collisions are assumed not
/// to occur.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateFingerprint(ContentHash);

impl StateFingerprint {
    /// Fingerprint an already-serialized state.
    #[must_use]
    pub fn from_dump(dump: &str) -> Self {
        Self(canonical_hash(DOMAIN_AGENT_STATE, dump.as_bytes()))
    }

    /// The underlying content hash.
    #[must_use]
    pub fn content_hash(&self) -> &ContentHash {
        &self.0
    }

    /// Short hex prefix, used for DOT node ids and log fields.
    #[must_use]
    pub fn short(&self) -> &str {
        let hex = self.0.hex_digest();
        &hex[..hex.len().min(12)]
    }
}

impl std::fmt::Display for StateFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Fingerprint an agent's current state.
#[must_use]
pub fn fingerprint<A: LoopAgentV1 + ?Sized>(agent: &A) -> StateFingerprint {
    StateFingerprint::from_dump(&agent.dump())
}
