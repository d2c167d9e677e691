//! Sealed audit records.
//!
//! A `SealedEntry` wraps the immutable part of an `AuditLogEntry` (everything
//! but the resolution) with its position in the digest chain. Resolutions are
//! annotations kept beside the chain, so attaching one never invalidates it.

use serde::{Deserialize, Serialize};

use veil_contracts::audit::AuditLogEntry;

/// One link in the SHA-256 digest chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedEntry {
    /// Append position, starting at 0.
    pub sequence: u64,

    /// The entry as appended, with `resolution` always `None`.
    pub entry: AuditLogEntry,

    /// Digest of the previous link, or `GENESIS_DIGEST` for the first.
    pub prev_digest: String,

    /// Digest over (sequence, prev_digest, canonical JSON of entry).
    pub digest: String,
}

impl SealedEntry {
    /// The `prev_digest` of the first link in every chain.
    pub const GENESIS_DIGEST: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}
