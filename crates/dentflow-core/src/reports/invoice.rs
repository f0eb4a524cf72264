//! Patient invoice.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{escape_csv, ReportHeader, StaffNames};
use crate::ledger::{BalancePosition, DateRange, PatientLedger};
use crate::models::{Patient, Payment, PaymentMethod, TreatmentRecord};

/// Printable invoice for one patient.
///
/// Lines and payments cover the requested period; the totals block always
/// reflects the patient's whole account so the balance due is never partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientInvoice {
    pub header: ReportHeader,
    pub patient: InvoicePatient,
    pub period: DateRange,
    pub lines: Vec<InvoiceLine>,
    pub payments: Vec<InvoicePaymentLine>,
    pub totals: InvoiceTotals,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePatient {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// One treatment charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub record_id: String,
    pub date: NaiveDate,
    pub treatment: String,
    pub dentist: String,
    pub teeth: Vec<String>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoicePaymentLine {
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// Charges within the period
    pub period_charges: Decimal,
    /// Payments and discounts within the period
    pub period_paid: Decimal,
    pub account: PatientLedger,
    pub position: BalancePosition,
}

impl PatientInvoice {
    pub fn build(
        header: ReportHeader,
        patient: &Patient,
        records: &[TreatmentRecord],
        payments: &[Payment],
        staff: &StaffNames,
        period: DateRange,
    ) -> Self {
        let account = PatientLedger::for_patient(&patient.id, records, payments);

        let mut lines: Vec<InvoiceLine> = records
            .iter()
            .filter(|r| r.patient_id == patient.id && period.contains(r.date))
            .map(|r| InvoiceLine {
                record_id: r.id.clone(),
                date: r.date,
                treatment: r.treatment_name.clone(),
                dentist: staff
                    .get(&r.dentist_id)
                    .cloned()
                    .unwrap_or_else(|| r.dentist_id.clone()),
                teeth: r.affected_teeth.iter().map(ToString::to_string).collect(),
                amount: r.charge(),
            })
            .collect();
        lines.sort_by_key(|l| l.date);

        let mut payment_lines: Vec<InvoicePaymentLine> = payments
            .iter()
            .filter(|p| p.patient_id == patient.id && period.contains(p.date))
            .map(|p| InvoicePaymentLine {
                date: p.date,
                method: p.method,
                amount: p.amount,
                notes: p.notes.clone(),
            })
            .collect();
        payment_lines.sort_by_key(|p| p.date);

        let totals = InvoiceTotals {
            period_charges: lines.iter().map(|l| l.amount).sum(),
            period_paid: payment_lines.iter().map(|p| p.amount).sum(),
            position: account.position(),
            account,
        };

        Self {
            header,
            patient: InvoicePatient {
                id: patient.id.clone(),
                name: patient.name.clone(),
                phone: patient.phone.clone(),
                address: patient.address.clone(),
            },
            period,
            lines,
            payments: payment_lines,
            totals,
        }
    }

    /// Whether the patient still owes money on the whole account.
    pub fn is_due(&self) -> bool {
        matches!(self.totals.position, BalancePosition::Owing(_))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// CSV with one row per charge and payment, then the account totals.
    pub fn to_csv(&self) -> String {
        let mut lines = vec!["kind,date,description,teeth,amount".to_string()];

        for line in &self.lines {
            lines.push(format!(
                "charge,{},{},{},{}",
                line.date,
                escape_csv(&format!("{} ({})", line.treatment, line.dentist)),
                escape_csv(&line.teeth.join(" ")),
                line.amount
            ));
        }
        for payment in &self.payments {
            lines.push(format!(
                "payment,{},{},,{}",
                payment.date,
                escape_csv(payment.method.as_str()),
                -payment.amount
            ));
        }

        let account = &self.totals.account;
        lines.push(format!("total,,charges,,{}", account.total_charges));
        lines.push(format!("total,,received,,{}", account.total_received));
        lines.push(format!("total,,discounts,,{}", account.total_discounts));
        lines.push(format!("total,,outstanding,,{}", account.outstanding));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinicConfig;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn record(patient: &Patient, name: &str, date: NaiveDate, doctor: Decimal, clinic: Decimal) -> TreatmentRecord {
        TreatmentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient.id.clone(),
            dentist_id: "dr-1".into(),
            treatment_definition_id: "def".into(),
            treatment_name: name.into(),
            date,
            affected_teeth: vec!["16".parse().unwrap(), "17".parse().unwrap()],
            consumed_items: vec![],
            material_cost: Decimal::ZERO,
            doctor_share: doctor,
            clinic_share: clinic,
            total_treatment_cost: doctor + clinic,
            notes: None,
            created_at: String::new(),
        }
    }

    fn invoice(period: DateRange) -> PatientInvoice {
        let patient = Patient::new("Mona".into());
        let records = vec![
            record(&patient, "Filling, composite", day(1), dec!(300), dec!(200)),
            record(&patient, "Crown", day(20), dec!(600), dec!(400)),
        ];
        let payments = vec![
            Payment::new(patient.id.clone(), dec!(400), PaymentMethod::Cash, day(2)),
            Payment::new(patient.id.clone(), dec!(100), PaymentMethod::Discount, day(21)),
        ];
        let staff = StaffNames::from([("dr-1".to_string(), "Dr. Yara".to_string())]);
        PatientInvoice::build(
            ReportHeader::from_config(&ClinicConfig::default()),
            &patient,
            &records,
            &payments,
            &staff,
            period,
        )
    }

    #[test]
    fn test_period_lines_with_full_account_totals() {
        let inv = invoice(DateRange::new(Some(day(1)), Some(day(10))));
        assert_eq!(inv.lines.len(), 1);
        assert_eq!(inv.lines[0].dentist, "Dr. Yara");
        assert_eq!(inv.totals.period_charges, dec!(500));
        assert_eq!(inv.totals.period_paid, dec!(400));
        assert_eq!(inv.totals.account.total_charges, dec!(1500));
        assert_eq!(inv.totals.account.outstanding, dec!(1000));
        assert!(inv.is_due());
    }

    #[test]
    fn test_csv_output() {
        let csv = invoice(DateRange::all()).to_csv();
        let rows: Vec<&str> = csv.lines().collect();
        // header + 2 charges + 2 payments + 4 totals
        assert_eq!(rows.len(), 9);
        assert!(rows[1].starts_with("charge,2024-03-01,\"Filling, composite (Dr. Yara)\",16 17,"));
        assert!(rows[3].starts_with("payment,2024-03-02,cash,,-400"));
        assert_eq!(rows[8], "total,,outstanding,,1000");
    }

    #[test]
    fn test_json_roundtrip_keeps_lines() {
        let json = invoice(DateRange::all()).to_json().unwrap();
        let parsed: PatientInvoice = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.payments[1].method, PaymentMethod::Discount);
    }
}
