//! Audit trail models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    DiscountApproved,
    TreatmentRepriced,
    PatientDeleted,
    PaymentDeleted,
    TreatmentDeleted,
    SupplierDeleted,
    DoctorPaymentDeleted,
}

/// One entry in the append-only audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub id: String,
    /// Position in the chain, starting at 1
    pub sequence: u64,
    /// Staff member who performed or approved the action
    pub actor_id: String,
    pub action: AuditAction,
    /// Id of the record acted on
    pub subject_id: String,
    pub patient_id: Option<String>,
    pub amount: Option<Decimal>,
    pub reason: Option<String>,
    pub at: String,
    /// Hash of the previous entry (None for the first)
    pub prev_hash: Option<String>,
    /// SHA-256 over the entry content and `prev_hash`
    pub hash: String,
}

/// Hashed content of an entry (everything except `hash`).
#[derive(Serialize)]
pub(crate) struct AuditPayload<'a> {
    pub id: &'a str,
    pub sequence: u64,
    pub actor_id: &'a str,
    pub action: AuditAction,
    pub subject_id: &'a str,
    pub patient_id: Option<&'a str>,
    pub amount: Option<Decimal>,
    pub reason: Option<&'a str>,
    pub at: &'a str,
    pub prev_hash: Option<&'a str>,
}

impl AuditEntry {
    pub(crate) fn payload(&self) -> AuditPayload<'_> {
        AuditPayload {
            id: &self.id,
            sequence: self.sequence,
            actor_id: &self.actor_id,
            action: self.action,
            subject_id: &self.subject_id,
            patient_id: self.patient_id.as_deref(),
            amount: self.amount,
            reason: self.reason.as_deref(),
            at: &self.at,
            prev_hash: self.prev_hash.as_deref(),
        }
    }
}
