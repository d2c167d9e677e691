//! # veil-audit
//!
//! Append-only, SHA-256 digest-chained in-memory audit log for the VEIL
//! governance client.
//!
//! ## Overview
//!
//! Every evaluated action is recorded as an `AuditLogEntry`. The log seals
//! the immutable part of each entry into a digest chain; tampering with a
//! sealed action or evaluation breaks the chain and is detected by
//! `verify_chain`. Human resolutions are attached beside the chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use veil_audit::AuditLog;
//! use veil_core::traits::AuditSink;
//!
//! let log = AuditLog::new();
//! log.append(entry)?;
//! assert!(log.verify_integrity());
//! ```

pub mod chain;
pub mod memory;
pub mod record;

pub use chain::{digest_entry, verify_chain};
pub use memory::AuditLog;
pub use record::SealedEntry;

// ── Tests ─────────────────────────────────────────────────────────────────────
