//! Clinic-wide financial summary over a date range.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{DoctorPayment, Expense, Payment, TreatmentRecord};

/// Inclusive date range. `None` bounds are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Unbounded range.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// Per-dentist slice of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DentistTotals {
    pub treatments: usize,
    pub charges: Decimal,
    pub doctor_share: Decimal,
    pub payouts: Decimal,
}

/// Totals for a period.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClinicSummary {
    pub range: DateRange,
    pub treatment_count: usize,
    /// Σ charges billed to patients
    pub charges: Decimal,
    pub doctor_shares: Decimal,
    /// Clinic shares, already net of materials
    pub clinic_shares: Decimal,
    pub material_costs: Decimal,
    /// Money received from patients (discounts excluded)
    pub collected: Decimal,
    pub discounts: Decimal,
    pub expenses: Decimal,
    pub doctor_payouts: Decimal,
    /// collected − expenses − doctor_payouts
    pub net_cash_flow: Decimal,
    /// Keyed by dentist id
    pub by_dentist: BTreeMap<String, DentistTotals>,
}

impl ClinicSummary {
    pub fn compute(
        range: DateRange,
        records: &[TreatmentRecord],
        payments: &[Payment],
        expenses: &[Expense],
        doctor_payments: &[DoctorPayment],
    ) -> Self {
        let mut summary = Self {
            range,
            ..Self::default()
        };

        for record in records.iter().filter(|r| range.contains(r.date)) {
            summary.treatment_count += 1;
            summary.charges += record.charge();
            summary.doctor_shares += record.doctor_share;
            summary.clinic_shares += record.clinic_share;
            summary.material_costs += record.material_cost;

            let dentist = summary.by_dentist.entry(record.dentist_id.clone()).or_default();
            dentist.treatments += 1;
            dentist.charges += record.charge();
            dentist.doctor_share += record.doctor_share;
        }

        for payment in payments.iter().filter(|p| range.contains(p.date)) {
            if payment.method.is_discount() {
                summary.discounts += payment.amount;
            } else {
                summary.collected += payment.amount;
            }
        }

        summary.expenses = expenses
            .iter()
            .filter(|e| range.contains(e.date))
            .map(|e| e.amount)
            .sum();

        for payout in doctor_payments.iter().filter(|p| range.contains(p.date)) {
            summary.doctor_payouts += payout.amount;
            summary
                .by_dentist
                .entry(payout.dentist_id.clone())
                .or_default()
                .payouts += payout.amount;
        }

        summary.net_cash_flow = summary.collected - summary.expenses - summary.doctor_payouts;
        summary
    }
}
