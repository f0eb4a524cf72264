//! Full patient file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ReportHeader, StaffNames};
use crate::ledger::{BalancePosition, PatientLedger};
use crate::models::{
    Appointment, DentalChart, LabCase, Patient, Payment, Prescription, TreatmentRecord,
};

/// A patient's records as loaded from the store.
#[derive(Debug, Clone, Default)]
pub struct PatientRecords {
    pub treatments: Vec<TreatmentRecord>,
    pub payments: Vec<Payment>,
    pub prescriptions: Vec<Prescription>,
    pub appointments: Vec<Appointment>,
    pub lab_cases: Vec<LabCase>,
}

/// Everything on file for one patient, ready to print.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientReport {
    pub header: ReportHeader,
    pub patient: Patient,
    /// Chart with every position filled in
    pub chart: DentalChart,
    pub chart_summary: BTreeMap<String, usize>,
    pub treatments: Vec<TreatmentRecord>,
    pub payments: Vec<Payment>,
    pub prescriptions: Vec<Prescription>,
    pub appointments: Vec<Appointment>,
    pub lab_cases: Vec<LabCase>,
    pub dentists: StaffNames,
    pub ledger: PatientLedger,
    pub position: BalancePosition,
}

impl PatientReport {
    pub fn build(header: ReportHeader, patient: &Patient, records: PatientRecords, staff: &StaffNames) -> Self {
        let PatientRecords {
            mut treatments,
            mut payments,
            mut prescriptions,
            mut appointments,
            mut lab_cases,
        } = records;
        treatments.retain(|r| r.patient_id == patient.id);
        payments.retain(|p| p.patient_id == patient.id);
        prescriptions.retain(|p| p.patient_id == patient.id);
        appointments.retain(|a| a.patient_id == patient.id);
        lab_cases.retain(|c| c.patient_id == patient.id);

        treatments.sort_by_key(|r| r.date);
        payments.sort_by_key(|p| p.date);
        prescriptions.sort_by_key(|p| p.date);
        appointments.sort_by_key(|a| a.start);
        lab_cases.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let chart = patient.dental_chart.with_defaults();
        let chart_summary = chart
            .status_counts()
            .into_iter()
            .map(|(status, count)| (status.to_string(), count))
            .collect();

        // Only the dentists this patient has seen.
        let dentists = treatments
            .iter()
            .map(|r| r.dentist_id.as_str())
            .chain(prescriptions.iter().map(|p| p.dentist_id.as_str()))
            .chain(appointments.iter().map(|a| a.dentist_id.as_str()))
            .filter_map(|id| staff.get(id).map(|name| (id.to_string(), name.clone())))
            .collect();

        let ledger = PatientLedger::compute(&treatments, &payments);
        Self {
            header,
            patient: patient.clone(),
            chart,
            chart_summary,
            treatments,
            payments,
            prescriptions,
            appointments,
            lab_cases,
            dentists,
            position: ledger.position(),
            ledger,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
