//! Printable reports.
//!
//! Every report is built from records passed in and carries everything it
//! needs to render, so a print view never reaches back into the store.
//! [`ReportBuilder`] is the convenience path that loads those records.

mod invoice;
mod patient;
mod statement;
mod summary;

pub use invoice::*;
pub use patient::*;
pub use statement::*;
pub use summary::*;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{ClinicConfig, ClinicProfile};
use crate::db::Repository;
use crate::ledger::DateRange;
use crate::models::{
    Appointment, DoctorPayment, Expense, LabCase, Patient, Payment, Prescription, StaffMember,
    Supplier, SupplierInvoice, TreatmentRecord,
};
use crate::services::{Clinic, ServiceResult};

/// Heading shared by all reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportHeader {
    pub clinic: ClinicProfile,
    /// ISO 4217 code amounts are expressed in
    pub currency: String,
    pub generated_at: String,
}

impl ReportHeader {
    pub fn from_config(config: &ClinicConfig) -> Self {
        Self {
            clinic: config.clinic.clone(),
            currency: config.currency.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Staff id to display name.
pub type StaffNames = HashMap<String, String>;

/// Loads records from a clinic and builds reports.
pub struct ReportBuilder<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<S: Repository> Clinic<S> {
    pub fn reports(&self) -> ReportBuilder<'_, S> {
        ReportBuilder::new(self)
    }
}

impl<'a, S: Repository> ReportBuilder<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    fn header(&self) -> ReportHeader {
        ReportHeader::from_config(self.clinic.config())
    }

    fn staff_names(&self) -> ServiceResult<StaffNames> {
        let staff: Vec<StaffMember> = self.clinic.store().list()?;
        Ok(staff.into_iter().map(|s| (s.id, s.name)).collect())
    }

    /// Patient invoice over `range`.
    pub fn invoice(&self, patient_id: &str, range: DateRange) -> ServiceResult<PatientInvoice> {
        let store = self.clinic.store();
        let patient: Patient = store.require(patient_id)?;
        let records: Vec<TreatmentRecord> = store.list_for(patient_id)?;
        let payments: Vec<Payment> = store.list_for(patient_id)?;
        Ok(PatientInvoice::build(
            self.header(),
            &patient,
            &records,
            &payments,
            &self.staff_names()?,
            range,
        ))
    }

    /// Everything on file for one patient.
    pub fn patient_report(&self, patient_id: &str) -> ServiceResult<PatientReport> {
        let store = self.clinic.store();
        let patient: Patient = store.require(patient_id)?;
        Ok(PatientReport::build(
            self.header(),
            &patient,
            PatientRecords {
                treatments: store.list_for::<TreatmentRecord>(patient_id)?,
                payments: store.list_for::<Payment>(patient_id)?,
                prescriptions: store.list_for::<Prescription>(patient_id)?,
                appointments: store.list_for::<Appointment>(patient_id)?,
                lab_cases: store.list_for::<LabCase>(patient_id)?,
            },
            &self.staff_names()?,
        ))
    }

    /// Statement of account with a supplier or lab.
    pub fn supplier_statement(&self, supplier_id: &str) -> ServiceResult<SupplierStatement> {
        let store = self.clinic.store();
        let supplier: Supplier = store.require(supplier_id)?;
        let invoices: Vec<SupplierInvoice> = store.list_for(supplier_id)?;
        let expenses: Vec<Expense> = store.list()?;
        Ok(SupplierStatement::build(
            self.header(),
            &supplier,
            &invoices,
            &expenses,
            self.clinic.today(),
        ))
    }

    /// Clinic-wide totals for a period.
    pub fn clinic_summary(&self, range: DateRange) -> ServiceResult<ClinicSummaryReport> {
        let store = self.clinic.store();
        let records: Vec<TreatmentRecord> = store.list()?;
        let payments: Vec<Payment> = store.list()?;
        let expenses: Vec<Expense> = store.list()?;
        let payouts: Vec<DoctorPayment> = store.list()?;
        Ok(ClinicSummaryReport::build(
            self.header(),
            range,
            &records,
            &payments,
            &expenses,
            &payouts,
            &self.staff_names()?,
        ))
    }
}

/// Escape a string for CSV output.
pub(crate) fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
