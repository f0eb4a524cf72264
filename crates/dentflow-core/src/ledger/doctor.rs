//! Dentist earnings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{DoctorPayment, TreatmentRecord};

/// Accrued doctor share against disbursements for one dentist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DoctorLedger {
    /// Σ doctor_share over the dentist's treatment records
    pub accrued: Decimal,
    /// Σ disbursements
    pub paid: Decimal,
    /// accrued − paid
    pub outstanding: Decimal,
    pub treatment_count: usize,
}

impl DoctorLedger {
    pub fn compute(dentist_id: &str, records: &[TreatmentRecord], payments: &[DoctorPayment]) -> Self {
        let mut accrued = Decimal::ZERO;
        let mut treatment_count = 0;
        for record in records.iter().filter(|r| r.dentist_id == dentist_id) {
            accrued += record.doctor_share;
            treatment_count += 1;
        }
        let paid: Decimal = payments
            .iter()
            .filter(|p| p.dentist_id == dentist_id)
            .map(|p| p.amount)
            .sum();

        Self {
            accrued,
            paid,
            outstanding: accrued - paid,
            treatment_count,
        }
    }
}
