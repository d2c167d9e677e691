//! Digest-chain primitives.
//!
//! Digest input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_digest as UTF-8 bytes (64 ASCII hex chars)
//!   3. canonical JSON of the entry (serde_json, no pretty-printing)

use sha2::{Digest, Sha256};

use veil_contracts::{
    audit::AuditLogEntry,
    error::{VeilError, VeilResult},
};

use crate::record::SealedEntry;

/// Compute the lowercase hex SHA-256 digest for one link.
pub fn digest_entry(sequence: u64, entry: &AuditLogEntry, prev_digest: &str) -> VeilResult<String> {
    let entry_json = serde_json::to_vec(entry).map_err(|e| VeilError::Decode {
        reason: format!("audit entry '{}' is not serializable: {}", entry.id, e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_digest.as_bytes());
    hasher.update(&entry_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Verify linkage and digest correctness of a chain, oldest link first.
///
/// An empty chain is valid.
pub fn verify_chain(links: &[SealedEntry]) -> bool {
    let mut expected_prev = SealedEntry::GENESIS_DIGEST.to_string();

    for (position, link) in links.iter().enumerate() {
        if link.sequence != position as u64 || link.prev_digest != expected_prev {
            return false;
        }

        match digest_entry(link.sequence, &link.entry, &link.prev_digest) {
            Ok(recomputed) if recomputed == link.digest => {}
            _ => return false,
        }

        expected_prev = link.digest.clone();
    }

    true
}
