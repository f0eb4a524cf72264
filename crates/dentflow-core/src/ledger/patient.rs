//! Patient balance computation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Payment, TreatmentRecord};

/// Where a patient stands after charges and payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalancePosition {
    /// Patient still owes this amount
    Owing(Decimal),
    Settled,
    /// Patient has paid this much more than charged
    Overpaid(Decimal),
}

/// A patient's financial position as of the records supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatientLedger {
    /// Σ (doctor_share + clinic_share)
    pub total_charges: Decimal,
    /// Σ payment amounts, discounts included
    pub total_paid: Decimal,
    /// Portion of `total_paid` that was discounts
    pub total_discounts: Decimal,
    /// Portion of `total_paid` that was money received
    pub total_received: Decimal,
    /// total_charges − total_paid (negative when overpaid)
    pub outstanding: Decimal,
}

impl PatientLedger {
    /// Compute from one patient's records and payments.
    pub fn compute(records: &[TreatmentRecord], payments: &[Payment]) -> Self {
        Self::from_iters(records.iter(), payments.iter())
    }

    /// Compute for one patient out of mixed collections.
    pub fn for_patient(
        patient_id: &str,
        records: &[TreatmentRecord],
        payments: &[Payment],
    ) -> Self {
        Self::from_iters(
            records.iter().filter(|r| r.patient_id == patient_id),
            payments.iter().filter(|p| p.patient_id == patient_id),
        )
    }

    fn from_iters<'a>(
        records: impl Iterator<Item = &'a TreatmentRecord>,
        payments: impl Iterator<Item = &'a Payment>,
    ) -> Self {
        let total_charges: Decimal = records.map(TreatmentRecord::charge).sum();

        let mut total_discounts = Decimal::ZERO;
        let mut total_received = Decimal::ZERO;
        for payment in payments {
            if payment.method.is_discount() {
                total_discounts += payment.amount;
            } else {
                total_received += payment.amount;
            }
        }
        let total_paid = total_discounts + total_received;

        Self {
            total_charges,
            total_paid,
            total_discounts,
            total_received,
            outstanding: total_charges - total_paid,
        }
    }

    pub fn position(&self) -> BalancePosition {
        if self.outstanding > Decimal::ZERO {
            BalancePosition::Owing(self.outstanding)
        } else if self.outstanding < Decimal::ZERO {
            BalancePosition::Overpaid(-self.outstanding)
        } else {
            BalancePosition::Settled
        }
    }
}

/// Σ charge over treatment records.
pub fn total_charges(records: &[TreatmentRecord]) -> Decimal {
    records.iter().map(TreatmentRecord::charge).sum()
}

/// Σ amount over payments, discounts included.
pub fn total_paid(payments: &[Payment]) -> Decimal {
    payments.iter().map(|p| p.amount).sum()
}

/// Charges minus payments. May be negative.
pub fn outstanding_balance(records: &[TreatmentRecord], payments: &[Payment]) -> Decimal {
    total_charges(records) - total_paid(payments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentMethod;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(patient_id: &str, doctor: Decimal, clinic: Decimal) -> TreatmentRecord {
        TreatmentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.into(),
            dentist_id: "d1".into(),
            treatment_definition_id: "def-1".into(),
            treatment_name: "Filling".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            affected_teeth: vec![],
            consumed_items: vec![],
            material_cost: Decimal::ZERO,
            doctor_share: doctor,
            clinic_share: clinic,
            total_treatment_cost: doctor + clinic,
            notes: None,
            created_at: "2024-03-01T10:00:00Z".into(),
        }
    }

    fn payment(patient_id: &str, amount: Decimal, method: PaymentMethod) -> Payment {
        Payment::new(
            patient_id.into(),
            amount,
            method,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
        )
    }

    #[test]
    fn test_outstanding_after_partial_payment() {
        let records = vec![record("p1", dec!(600), dec!(300))];
        let payments = vec![payment("p1", dec!(400), PaymentMethod::Cash)];

        let ledger = PatientLedger::compute(&records, &payments);
        assert_eq!(ledger.total_charges, dec!(900));
        assert_eq!(ledger.total_paid, dec!(400));
        assert_eq!(ledger.outstanding, dec!(500));
        assert_eq!(ledger.position(), BalancePosition::Owing(dec!(500)));
        assert_eq!(outstanding_balance(&records, &payments), dec!(500));
    }

    #[test]
    fn test_discount_counts_as_paid() {
        let records = vec![record("p1", dec!(600), dec!(300))];
        let payments = vec![
            payment("p1", dec!(800), PaymentMethod::Card),
            payment("p1", dec!(100), PaymentMethod::Discount),
        ];

        let ledger = PatientLedger::compute(&records, &payments);
        assert_eq!(ledger.total_discounts, dec!(100));
        assert_eq!(ledger.total_received, dec!(800));
        assert_eq!(ledger.position(), BalancePosition::Settled);
    }

    #[test]
    fn test_overpaid_is_negative() {
        let records = vec![record("p1", dec!(100), dec!(50))];
        let payments = vec![payment("p1", dec!(200), PaymentMethod::Cash)];

        let ledger = PatientLedger::compute(&records, &payments);
        assert_eq!(ledger.outstanding, dec!(-50));
        assert_eq!(ledger.position(), BalancePosition::Overpaid(dec!(50)));
    }

    #[test]
    fn test_for_patient_filters() {
        let records = vec![
            record("p1", dec!(100), dec!(50)),
            record("p2", dec!(1000), dec!(500)),
        ];
        let payments = vec![payment("p2", dec!(10), PaymentMethod::Cash)];

        let ledger = PatientLedger::for_patient("p1", &records, &payments);
        assert_eq!(ledger.total_charges, dec!(150));
        assert_eq!(ledger.total_paid, dec!(0));
    }

    #[test]
    fn test_charges_use_shares_not_stored_total() {
        let mut r = record("p1", dec!(600), dec!(300));
        r.total_treatment_cost = dec!(1000);
        assert!(!r.is_consistent());
        assert_eq!(total_charges(&[r]), dec!(900));
    }
}
