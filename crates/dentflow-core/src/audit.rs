//! Append-only audit trail.
//!
//! Each entry's hash covers its own fields and the previous entry's hash, so
//! editing or removing any entry breaks every hash after it.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::db::{DbError, Repository};
use crate::models::{AuditAction, AuditEntry};

/// Audit chain errors.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entry {sequence} does not link to the previous entry")]
    BrokenLink { sequence: u64 },

    #[error("entry {sequence} hash does not match its contents")]
    HashMismatch { sequence: u64 },

    #[error("expected sequence {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },
}

pub type AuditResult<T> = Result<T, AuditError>;

/// What is being recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent<'e> {
    pub actor_id: &'e str,
    pub action: AuditAction,
    pub subject_id: &'e str,
    pub patient_id: Option<&'e str>,
    pub amount: Option<Decimal>,
    pub reason: Option<&'e str>,
}

impl<'e> AuditEvent<'e> {
    pub fn new(actor_id: &'e str, action: AuditAction, subject_id: &'e str) -> Self {
        Self {
            actor_id,
            action,
            subject_id,
            patient_id: None,
            amount: None,
            reason: None,
        }
    }

    pub fn patient(mut self, patient_id: &'e str) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn reason(mut self, reason: Option<&'e str>) -> Self {
        self.reason = reason;
        self
    }
}

/// Audit log over a store.
pub struct AuditLog<'a, S: Repository> {
    store: &'a S,
}

impl<'a, S: Repository> AuditLog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Entries ordered by sequence.
    pub fn entries(&self) -> AuditResult<Vec<AuditEntry>> {
        let mut entries: Vec<AuditEntry> = self.store.list()?;
        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }

    /// Entries that concern one patient.
    pub fn for_patient(&self, patient_id: &str) -> AuditResult<Vec<AuditEntry>> {
        let mut entries: Vec<AuditEntry> = self.store.list_for(patient_id)?;
        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }

    /// Append an entry chained to the current head.
    ///
    /// Call inside the same `atomically` unit as the mutation being audited.
    pub fn append(&self, event: AuditEvent<'_>) -> AuditResult<AuditEntry> {
        let head = self.entries()?.pop();
        let (sequence, prev_hash) = match head {
            Some(last) => (last.sequence + 1, Some(last.hash)),
            None => (1, None),
        };

        let mut entry = AuditEntry {
            id: uuid::Uuid::new_v4().to_string(),
            sequence,
            actor_id: event.actor_id.to_string(),
            action: event.action,
            subject_id: event.subject_id.to_string(),
            patient_id: event.patient_id.map(str::to_string),
            amount: event.amount,
            reason: event.reason.map(str::to_string),
            at: chrono::Utc::now().to_rfc3339(),
            prev_hash,
            hash: String::new(),
        };
        entry.hash = entry_hash(&entry)?;

        self.store.add(&entry)?;
        Ok(entry)
    }

    /// Verify the stored chain.
    pub fn verify(&self) -> AuditResult<()> {
        verify_chain(&self.entries()?)
    }
}

/// Hex SHA-256 over the entry's canonical JSON (which includes `prev_hash`).
pub fn entry_hash(entry: &AuditEntry) -> AuditResult<String> {
    let payload = serde_json::to_vec(&entry.payload())?;
    Ok(hash_data(&payload))
}

/// Check sequence continuity, links and hashes of entries in sequence order.
pub fn verify_chain(entries: &[AuditEntry]) -> AuditResult<()> {
    let mut prev: Option<&str> = None;
    for (index, entry) in entries.iter().enumerate() {
        let expected = index as u64 + 1;
        if entry.sequence != expected {
            return Err(AuditError::SequenceGap {
                expected,
                found: entry.sequence,
            });
        }
        if entry.prev_hash.as_deref() != prev {
            return Err(AuditError::BrokenLink {
                sequence: entry.sequence,
            });
        }
        if entry_hash(entry)? != entry.hash {
            return Err(AuditError::HashMismatch {
                sequence: entry.sequence,
            });
        }
        prev = Some(&entry.hash);
    }
    Ok(())
}

fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
