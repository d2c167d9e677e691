//! In-memory implementation of `AuditSink`.
//!
//! `AuditLog` is a cheaply cloneable handle; every clone sees the same log.
//! It is the client's view of the backend's audit trail: appended to as
//! actions are evaluated, replaced wholesale when `GET /logs` succeeds.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{debug, info};

use veil_contracts::{
    audit::{AuditLogEntry, Resolution},
    error::{VeilError, VeilResult},
};
use veil_core::traits::AuditSink;

use crate::{
    chain::{digest_entry, verify_chain},
    record::SealedEntry,
};

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct LogState {
    /// Sealed links in append order (oldest first).
    pub(crate) links: Vec<SealedEntry>,

    /// Resolutions keyed by entry id.
    pub(crate) resolutions: HashMap<String, Resolution>,
}

impl LogState {
    fn last_digest(&self) -> String {
        self.links
            .last()
            .map(|l| l.digest.clone())
            .unwrap_or_else(|| SealedEntry::GENESIS_DIGEST.to_string())
    }

    fn seal(&mut self, mut entry: AuditLogEntry) -> VeilResult<()> {
        if let Some(resolution) = entry.resolution.take() {
            self.resolutions.insert(entry.id.clone(), resolution);
        }
        let sequence = self.links.len() as u64;
        let prev_digest = self.last_digest();
        let digest = digest_entry(sequence, &entry, &prev_digest)?;
        self.links.push(SealedEntry {
            sequence,
            entry,
            prev_digest,
            digest,
        });
        Ok(())
    }

    fn materialize(&self, link: &SealedEntry) -> AuditLogEntry {
        let mut entry = link.entry.clone();
        entry.resolution = self.resolutions.get(&entry.id).cloned();
        entry
    }
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An append-only audit log backed by a SHA-256 digest chain.
#[derive(Clone, Default)]
pub struct AuditLog {
    pub(crate) state: Arc<Mutex<LogState>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the whole log with `entries`, given most recent first, as
    /// returned by the backend. The chain is rebuilt oldest first.
    pub fn replace_all(&self, entries: Vec<AuditLogEntry>) -> VeilResult<()> {
        let mut state = self.lock();
        *state = LogState::default();
        for entry in entries.into_iter().rev() {
            state.seal(entry)?;
        }
        debug!(count = state.links.len(), "audit log replaced");
        Ok(())
    }

    /// Attach a resolution to an existing entry, replacing any earlier one.
    pub fn resolve(&self, entry_id: &str, resolution: Resolution) -> VeilResult<AuditLogEntry> {
        let mut state = self.lock();
        let position = state
            .links
            .iter()
            .position(|l| l.entry.id == entry_id)
            .ok_or_else(|| VeilError::Validation {
                reason: format!("audit entry '{}' not found", entry_id),
            })?;
        info!(
            entry_id = %entry_id,
            status = ?resolution.status,
            resolver = %resolution.resolver,
            "audit entry resolved"
        );
        state.resolutions.insert(entry_id.to_string(), resolution);
        Ok(state.materialize(&state.links[position]))
    }

    pub fn get(&self, entry_id: &str) -> Option<AuditLogEntry> {
        let state = self.lock();
        state
            .links
            .iter()
            .find(|l| l.entry.id == entry_id)
            .map(|l| state.materialize(l))
    }

    /// Entries for one agent, most recent first.
    pub fn for_agent(&self, agent_id: &str) -> Vec<AuditLogEntry> {
        let state = self.lock();
        state
            .links
            .iter()
            .rev()
            .filter(|l| l.entry.agent_id == agent_id)
            .map(|l| state.materialize(l))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Digest of the newest link, or `GENESIS_DIGEST` when empty.
    pub fn head_digest(&self) -> String {
        self.lock().last_digest()
    }

    /// The sealed chain, oldest first.
    pub fn sealed(&self) -> Vec<SealedEntry> {
        self.lock().links.clone()
    }

    /// Confirm no sealed entry was altered in memory.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.lock().links)
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

impl AuditSink for AuditLog {
    fn append(&self, entry: AuditLogEntry) -> VeilResult<()> {
        let mut state = self.lock();
        let entry_id = entry.id.clone();
        state.seal(entry)?;
        debug!(entry_id = %entry_id, sequence = state.links.len() - 1, "audit entry appended");
        Ok(())
    }

    fn clear(&self) {
        let mut state = self.lock();
        *state = LogState::default();
        info!("audit log cleared");
    }

    fn entries(&self) -> Vec<AuditLogEntry> {
        let state = self.lock();
        state.links.iter().rev().map(|l| state.materialize(l)).collect()
    }
}
