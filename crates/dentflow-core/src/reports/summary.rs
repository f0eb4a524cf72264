//! Clinic financial summary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{escape_csv, ReportHeader, StaffNames};
use crate::ledger::{ClinicSummary, DateRange};
use crate::models::{DoctorPayment, Expense, Payment, TreatmentRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicSummaryReport {
    pub header: ReportHeader,
    pub summary: ClinicSummary,
    pub dentists: Vec<DentistSummaryLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DentistSummaryLine {
    pub dentist_id: String,
    pub name: String,
    pub treatments: usize,
    pub charges: Decimal,
    pub doctor_share: Decimal,
    pub payouts: Decimal,
}

impl ClinicSummaryReport {
    pub fn build(
        header: ReportHeader,
        range: DateRange,
        records: &[TreatmentRecord],
        payments: &[Payment],
        expenses: &[Expense],
        doctor_payments: &[DoctorPayment],
        staff: &StaffNames,
    ) -> Self {
        let summary = ClinicSummary::compute(range, records, payments, expenses, doctor_payments);

        let mut dentists: Vec<DentistSummaryLine> = summary
            .by_dentist
            .iter()
            .map(|(id, totals)| DentistSummaryLine {
                dentist_id: id.clone(),
                name: staff.get(id).cloned().unwrap_or_else(|| id.clone()),
                treatments: totals.treatments,
                charges: totals.charges,
                doctor_share: totals.doctor_share,
                payouts: totals.payouts,
            })
            .collect();
        dentists.sort_by(|a, b| b.charges.cmp(&a.charges).then_with(|| a.name.cmp(&b.name)));

        Self {
            header,
            summary,
            dentists,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Per-dentist breakdown as CSV.
    pub fn to_csv(&self) -> String {
        let mut lines = vec!["dentist,treatments,charges,doctor_share,payouts".to_string()];
        for line in &self.dentists {
            lines.push(format!(
                "{},{},{},{},{}",
                escape_csv(&line.name),
                line.treatments,
                line.charges,
                line.doctor_share,
                line.payouts
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinicConfig;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(dentist: &str, doctor: Decimal, clinic: Decimal) -> TreatmentRecord {
        TreatmentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: "p".into(),
            dentist_id: dentist.into(),
            treatment_definition_id: "def".into(),
            treatment_name: "Scaling".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            affected_teeth: vec![],
            consumed_items: vec![],
            material_cost: Decimal::ZERO,
            doctor_share: doctor,
            clinic_share: clinic,
            total_treatment_cost: doctor + clinic,
            notes: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_dentists_ranked_by_charges() {
        let staff = StaffNames::from([
            ("a".to_string(), "Dr. Adel".to_string()),
            ("b".to_string(), "Dr. Basma".to_string()),
        ]);
        let report = ClinicSummaryReport::build(
            ReportHeader::from_config(&ClinicConfig::default()),
            DateRange::all(),
            &[record("a", dec!(100), dec!(100)), record("b", dec!(300), dec!(200))],
            &[],
            &[],
            &[],
            &staff,
        );

        assert_eq!(report.summary.charges, dec!(700));
        assert_eq!(report.dentists[0].name, "Dr. Basma");
        assert_eq!(report.to_csv().lines().nth(1), Some("Dr. Basma,1,500,300,0"));
    }
}
