//! DentFlow Core Library
//!
//! Local-first practice management for a dental clinic: patients and their
//! odontograms, treatments priced with a doctor/clinic split, payments and
//! approved discounts, suppliers and dental labs, and a hash-chained audit log.
//!
//! # Architecture
//!
//! ```text
//!   UI / FFI (ClinicCore)
//!          │
//!          ▼
//!   services::Clinic ──── config · clock · file store
//!          │
//!          ├── ledger      pure balance math (patients, doctors, suppliers)
//!          ├── chart       odontogram editing
//!          ├── discount    approval rules
//!          ├── audit       append-only hash chain
//!          └── reports     invoices, statements, summaries
//!          │
//!          ▼
//!   db::Repository ── Database (SQLite) | MemoryStore
//! ```
//!
//! # Core Principle
//!
//! **Balances are derived, never stored.** Every outstanding amount is
//! recomputed from treatment records and payments.
//!
//! # Modules
//!
//! - [`db`]: Repository boundary with SQLite and in-memory stores
//! - [`models`]: Domain types (Patient, TreatmentRecord, Payment, etc.)
//! - [`ledger`]: Charge split and balance computation
//! - [`services`]: Validated operations over a store
//! - [`reports`]: Printable invoices, statements and summaries

pub mod audit;
pub mod chart;
pub mod clock;
pub mod config;
pub mod db;
pub mod discount;
pub mod ledger;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod reports;
pub mod scheduler;
pub mod services;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use config::ClinicConfig;
pub use db::{Database, MemoryStore, Repository};
pub use ledger::{ChargeSplit, ClinicSummary, DateRange, DoctorLedger, PatientLedger, SupplierLedger};
pub use models::{
    DentalChart, Patient, Payment, PaymentMethod, Supplier, SupplierInvoice, ToothId, ToothStatus,
    TreatmentDefinition, TreatmentRecord,
};
pub use services::{Clinic, ServiceError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::discount::DiscountRequest;
use crate::services::{
    DefinitionInput, DoctorPaymentInput, InvoiceInput, MaterialUse, PatientInput, PaymentInput,
    StaffInput, SupplierInput, TreatmentInput,
};
use crate::storage::LocalFileStore;
use crate::validation::Confirmation;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    /// The operation was refused; `key` indexes the message catalog.
    #[error("{message}")]
    Rejected { key: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for ClinicError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(what) => ClinicError::NotFound(what),
            ServiceError::Database(db) => ClinicError::DatabaseError(db.to_string()),
            e if e.is_rejection() => ClinicError::Rejected {
                key: e.message_key().to_string(),
                message: e.to_string(),
            },
            e => ClinicError::Internal(e.to_string()),
        }
    }
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        ServiceError::from(e).into()
    }
}

impl From<audit::AuditError> for ClinicError {
    fn from(e: audit::AuditError) -> Self {
        ClinicError::Internal(e.to_string())
    }
}

impl From<config::ConfigError> for ClinicError {
    fn from(e: config::ConfigError) -> Self {
        ClinicError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::Internal(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the tracing subscriber. Returns false if one was already set.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    logging::init_logging(filter.as_deref())
}

/// Open or create a clinic database at the given path.
///
/// `config_json` overrides the default configuration; `files_root` enables
/// attachment and invoice scan uploads under that directory.
#[uniffi::export]
pub fn open_database(
    path: String,
    config_json: Option<String>,
    files_root: Option<String>,
) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open(&path)?;
    ClinicCore::build(db, config_json, files_root)
}

/// Create an in-memory clinic database (for testing).
#[uniffi::export]
pub fn open_database_in_memory(config_json: Option<String>) -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    ClinicCore::build(db, config_json, None)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    clinic: Arc<Mutex<Clinic<Database>>>,
}

impl ClinicCore {
    fn build(
        db: Database,
        config_json: Option<String>,
        files_root: Option<String>,
    ) -> Result<Arc<Self>, ClinicError> {
        let config = match config_json {
            Some(json) => ClinicConfig::from_json_str(&json)?,
            None => ClinicConfig::default(),
        };
        let mut clinic = Clinic::new(db, config);
        if let Some(root) = files_root {
            clinic = clinic.with_file_store(LocalFileStore::new(root));
        }
        Ok(Arc::new(Self {
            clinic: Arc::new(Mutex::new(clinic)),
        }))
    }
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Staff Operations
    // =========================================================================

    pub fn add_staff(&self, input: FfiStaffInput) -> Result<FfiStaff, ClinicError> {
        let clinic = self.clinic.lock()?;
        let member = clinic.staff().add(input.try_into()?)?;
        Ok(member.into())
    }

    /// Active dentists, by name.
    pub fn list_dentists(&self) -> Result<Vec<FfiStaff>, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.staff().dentists()?.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    pub fn create_patient(&self, input: FfiPatientInput) -> Result<FfiPatient, ClinicError> {
        let clinic = self.clinic.lock()?;
        let patient = clinic.patients().create(input.try_into()?)?;
        Ok(patient.into())
    }

    pub fn update_patient(&self, id: String, input: FfiPatientInput) -> Result<FfiPatient, ClinicError> {
        let clinic = self.clinic.lock()?;
        let patient = clinic.patients().update(&id, input.try_into()?)?;
        Ok(patient.into())
    }

    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.patients().get(&id)?.map(Into::into))
    }

    /// Search patients by name or phone.
    pub fn search_patients(&self, query: String, limit: u32) -> Result<Vec<FfiPatient>, ClinicError> {
        let clinic = self.clinic.lock()?;
        let patients = clinic.patients().search(&query, limit as usize)?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    /// Delete a patient and everything recorded against them.
    pub fn delete_patient(&self, id: String, actor_id: String, confirmed: bool) -> Result<(), ClinicError> {
        let clinic = self.clinic.lock()?;
        clinic.patients().delete(&id, &actor_id, confirmation(confirmed))?;
        Ok(())
    }

    pub fn upload_patient_attachment(
        &self,
        patient_id: String,
        file_name: String,
        bytes: Vec<u8>,
        content_type: String,
    ) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        let attachment = clinic
            .patients()
            .upload_attachment(&patient_id, &file_name, &bytes, &content_type)?;
        Ok(attachment.url)
    }

    /// Messaging deep link for a patient, rendered from `template` or the
    /// configured default.
    pub fn patient_message_link(&self, patient_id: String, template: Option<String>) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic
            .patients()
            .message_link(&patient_id, template.as_deref(), None)?)
    }

    // =========================================================================
    // Chart Operations
    // =========================================================================

    /// All 32 positions, missing ones shown as healthy.
    pub fn get_chart(&self, patient_id: String) -> Result<Vec<FfiTooth>, ClinicError> {
        let clinic = self.clinic.lock()?;
        let chart = clinic.patients().display_chart(&patient_id)?;
        Ok(chart.iter().map(|(id, entry)| FfiTooth {
            tooth: id.to_string(),
            status: entry.status.as_str().to_string(),
            notes: entry.notes.clone(),
        }).collect())
    }

    pub fn edit_tooth(
        &self,
        patient_id: String,
        tooth: String,
        status: String,
        notes: String,
    ) -> Result<(), ClinicError> {
        let clinic = self.clinic.lock()?;
        clinic
            .patients()
            .edit_tooth(&patient_id, parse_tooth(&tooth)?, parse_status(&status)?, &notes)?;
        Ok(())
    }

    pub fn bulk_edit_teeth(
        &self,
        patient_id: String,
        teeth: Vec<String>,
        status: String,
        notes: String,
    ) -> Result<(), ClinicError> {
        let clinic = self.clinic.lock()?;
        let teeth = parse_teeth(&teeth)?;
        clinic
            .patients()
            .bulk_edit_teeth(&patient_id, &teeth, parse_status(&status)?, &notes)?;
        Ok(())
    }

    // =========================================================================
    // Treatment Operations
    // =========================================================================

    pub fn add_treatment_definition(&self, input: FfiDefinitionInput) -> Result<FfiDefinition, ClinicError> {
        let clinic = self.clinic.lock()?;
        let definition = clinic.treatments().add_definition(input.try_into()?)?;
        Ok(definition.into())
    }

    pub fn list_treatment_definitions(&self, active_only: bool) -> Result<Vec<FfiDefinition>, ClinicError> {
        let clinic = self.clinic.lock()?;
        let definitions = clinic.treatments().definitions(active_only)?;
        Ok(definitions.into_iter().map(Into::into).collect())
    }

    /// Record a performed treatment, consuming inventory.
    pub fn record_treatment(&self, input: FfiTreatmentInput) -> Result<FfiTreatmentRecord, ClinicError> {
        let clinic = self.clinic.lock()?;
        let record = clinic.treatments().record(input.try_into()?)?;
        Ok(record.into())
    }

    pub fn reprice_treatment(
        &self,
        record_id: String,
        price: String,
        actor_id: String,
        reason: Option<String>,
    ) -> Result<FfiTreatmentRecord, ClinicError> {
        let clinic = self.clinic.lock()?;
        let record = clinic.treatments().reprice(
            &record_id,
            parse_amount("price", &price)?,
            &actor_id,
            reason.as_deref(),
        )?;
        Ok(record.into())
    }

    // =========================================================================
    // Payment Operations
    // =========================================================================

    pub fn add_payment(&self, input: FfiPaymentInput) -> Result<FfiPayment, ClinicError> {
        let clinic = self.clinic.lock()?;
        let payment = clinic.payments().add(input.try_into()?)?;
        Ok(payment.into())
    }

    pub fn apply_discount(&self, input: FfiDiscountInput) -> Result<FfiPayment, ClinicError> {
        let clinic = self.clinic.lock()?;
        let payment = clinic.payments().apply_discount(DiscountRequest {
            patient_id: input.patient_id,
            amount: parse_amount("amount", &input.amount)?,
            approver_id: input.approver_id,
            reason: input.reason,
            date: parse_date("date", &input.date)?,
        })?;
        Ok(payment.into())
    }

    pub fn patient_ledger(&self, patient_id: String) -> Result<FfiPatientLedger, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.patients().ledger(&patient_id)?.into())
    }

    pub fn pay_doctor(
        &self,
        dentist_id: String,
        amount: String,
        date: String,
        acknowledge_duplicate: bool,
    ) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        let payment = clinic.doctor_payments().pay(DoctorPaymentInput {
            dentist_id,
            amount: parse_amount("amount", &amount)?,
            date: parse_date("date", &date)?,
            notes: None,
            acknowledge_duplicate,
        })?;
        Ok(payment.id)
    }

    /// Amount still owed to a dentist.
    pub fn doctor_outstanding(&self, dentist_id: String) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.doctor_payments().ledger(&dentist_id)?.outstanding.to_string())
    }

    // =========================================================================
    // Supplier Operations
    // =========================================================================

    pub fn add_supplier(&self, name: String, kind: String) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        let supplier = clinic.suppliers().add(SupplierInput {
            name,
            kind: parse_enum("kind", &kind)?,
            contact_name: None,
            phone: None,
            email: None,
            address: None,
            notes: None,
        })?;
        Ok(supplier.id)
    }

    pub fn add_supplier_invoice(
        &self,
        supplier_id: String,
        invoice_number: Option<String>,
        date: String,
        due_date: Option<String>,
        amount: String,
    ) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        let invoice = clinic.suppliers().add_invoice(InvoiceInput {
            supplier_id,
            invoice_number,
            date: parse_date("date", &date)?,
            due_date: due_date.map(|d| parse_date("due_date", &d)).transpose()?,
            amount: parse_amount("amount", &amount)?,
            items: Vec::new(),
            notes: None,
        })?;
        Ok(invoice.id)
    }

    pub fn pay_supplier_invoice(&self, invoice_id: String, amount: String, date: String) -> Result<(), ClinicError> {
        let clinic = self.clinic.lock()?;
        clinic
            .suppliers()
            .pay_invoice(&invoice_id, parse_amount("amount", &amount)?, parse_date("date", &date)?)?;
        Ok(())
    }

    /// Settle whatever remains on an invoice. Returns false if nothing did.
    pub fn pay_supplier_invoice_remaining(&self, invoice_id: String, date: String) -> Result<bool, ClinicError> {
        let clinic = self.clinic.lock()?;
        let paid = clinic
            .suppliers()
            .pay_remaining(&invoice_id, parse_date("date", &date)?)?;
        Ok(paid.is_some())
    }

    pub fn supplier_ledger(&self, supplier_id: String) -> Result<FfiSupplierLedger, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.suppliers().ledger(&supplier_id)?.into())
    }

    // =========================================================================
    // Audit Operations
    // =========================================================================

    /// Verify the audit hash chain; returns the number of entries checked.
    pub fn verify_audit_log(&self) -> Result<u32, ClinicError> {
        let clinic = self.clinic.lock()?;
        let log = audit::AuditLog::new(clinic.store());
        log.verify()?;
        Ok(log.entries()?.len() as u32)
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    pub fn export_invoice_json(&self, patient_id: String, from: Option<String>, to: Option<String>) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        let invoice = clinic.reports().invoice(&patient_id, parse_range(from, to)?)?;
        Ok(invoice.to_json()?)
    }

    pub fn export_invoice_csv(&self, patient_id: String, from: Option<String>, to: Option<String>) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        let invoice = clinic.reports().invoice(&patient_id, parse_range(from, to)?)?;
        Ok(invoice.to_csv())
    }

    pub fn export_patient_report_json(&self, patient_id: String) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.reports().patient_report(&patient_id)?.to_json()?)
    }

    pub fn export_supplier_statement_json(&self, supplier_id: String) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.reports().supplier_statement(&supplier_id)?.to_json()?)
    }

    pub fn export_supplier_statement_csv(&self, supplier_id: String) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.reports().supplier_statement(&supplier_id)?.to_csv())
    }

    pub fn export_clinic_summary_json(&self, from: Option<String>, to: Option<String>) -> Result<String, ClinicError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.reports().clinic_summary(parse_range(from, to)?)?.to_json()?)
    }
}

// =========================================================================
// Input Parsing
// =========================================================================

fn confirmation(confirmed: bool) -> Confirmation {
    if confirmed {
        Confirmation::Confirmed
    } else {
        Confirmation::Pending
    }
}

fn parse_amount(field: &str, value: &str) -> Result<Decimal, ClinicError> {
    Decimal::from_str(value.trim())
        .map_err(|e| ClinicError::InvalidInput(format!("{field}: {e}")))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ClinicError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| ClinicError::InvalidInput(format!("{field}: {e}")))
}

fn parse_range(from: Option<String>, to: Option<String>) -> Result<DateRange, ClinicError> {
    Ok(DateRange::new(
        from.map(|d| parse_date("from", &d)).transpose()?,
        to.map(|d| parse_date("to", &d)).transpose()?,
    ))
}

fn parse_tooth(value: &str) -> Result<ToothId, ClinicError> {
    value
        .parse()
        .map_err(|e: models::InvalidToothId| ClinicError::InvalidInput(e.to_string()))
}

fn parse_teeth(values: &[String]) -> Result<Vec<ToothId>, ClinicError> {
    values.iter().map(|t| parse_tooth(t)).collect()
}

fn parse_status(value: &str) -> Result<ToothStatus, ClinicError> {
    value.parse().map_err(ClinicError::InvalidInput)
}

/// Parse a unit enum by its variant name, e.g. `"DentalLab"`.
fn parse_enum<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, ClinicError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| ClinicError::InvalidInput(format!("{field}: unknown value {value:?}")))
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe staff form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStaffInput {
    pub name: String,
    /// Role variant name, e.g. "Dentist"
    pub role: String,
    pub specialty: Option<String>,
    pub phone: Option<String>,
}

impl TryFrom<FfiStaffInput> for StaffInput {
    type Error = ClinicError;

    fn try_from(input: FfiStaffInput) -> Result<Self, Self::Error> {
        Ok(StaffInput {
            name: input.name,
            role: parse_enum("role", &input.role)?,
            specialty: input.specialty,
            phone: input.phone,
            email: None,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStaff {
    pub id: String,
    pub name: String,
    pub role: String,
    pub specialty: Option<String>,
    pub active: bool,
}

impl From<models::StaffMember> for FfiStaff {
    fn from(member: models::StaffMember) -> Self {
        Self {
            id: member.id,
            name: member.name,
            role: format!("{:?}", member.role),
            specialty: member.specialty,
            active: member.active,
        }
    }
}

/// FFI-safe patient form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// YYYY-MM-DD
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Vec<String>,
    pub notes: Option<String>,
}

impl TryFrom<FfiPatientInput> for PatientInput {
    type Error = ClinicError;

    fn try_from(input: FfiPatientInput) -> Result<Self, Self::Error> {
        Ok(PatientInput {
            name: input.name,
            phone: input.phone,
            email: input.email,
            date_of_birth: input
                .date_of_birth
                .map(|d| parse_date("date_of_birth", &d))
                .transpose()?,
            gender: input.gender,
            address: input.address,
            medical_history: input.medical_history,
            allergies: input.allergies,
            notes: input.notes,
        })
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub allergies: Vec<String>,
    pub last_visit: Option<String>,
    pub attachment_count: u32,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            phone: patient.phone,
            email: patient.email,
            date_of_birth: patient.date_of_birth.map(|d| d.to_string()),
            allergies: patient.allergies,
            last_visit: patient.last_visit.map(|d| d.to_string()),
            attachment_count: patient.attachments.len() as u32,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTooth {
    /// FDI number, e.g. "36"
    pub tooth: String,
    pub status: String,
    pub notes: String,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDefinitionInput {
    pub name: String,
    pub description: Option<String>,
    pub base_price: String,
    /// Fraction in [0, 1]
    pub doctor_percentage: String,
    pub clinic_percentage: String,
    pub chart_status: Option<String>,
}

impl TryFrom<FfiDefinitionInput> for DefinitionInput {
    type Error = ClinicError;

    fn try_from(input: FfiDefinitionInput) -> Result<Self, Self::Error> {
        Ok(DefinitionInput {
            name: input.name,
            description: input.description,
            base_price: parse_amount("base_price", &input.base_price)?,
            doctor_percentage: parse_amount("doctor_percentage", &input.doctor_percentage)?,
            clinic_percentage: parse_amount("clinic_percentage", &input.clinic_percentage)?,
            chart_status: input.chart_status.as_deref().map(parse_status).transpose()?,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDefinition {
    pub id: String,
    pub name: String,
    pub base_price: String,
    pub doctor_percentage: String,
    pub clinic_percentage: String,
    pub active: bool,
}

impl From<TreatmentDefinition> for FfiDefinition {
    fn from(def: TreatmentDefinition) -> Self {
        Self {
            id: def.id,
            name: def.name,
            base_price: def.base_price.to_string(),
            doctor_percentage: def.doctor_percentage.to_string(),
            clinic_percentage: def.clinic_percentage.to_string(),
            active: def.active,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMaterialUse {
    pub item_id: String,
    pub quantity: String,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatmentInput {
    pub patient_id: String,
    pub dentist_id: String,
    pub definition_id: String,
    pub date: String,
    pub affected_teeth: Vec<String>,
    pub materials: Vec<FfiMaterialUse>,
    pub notes: Option<String>,
}

impl TryFrom<FfiTreatmentInput> for TreatmentInput {
    type Error = ClinicError;

    fn try_from(input: FfiTreatmentInput) -> Result<Self, Self::Error> {
        let materials = input
            .materials
            .into_iter()
            .map(|m| {
                Ok(MaterialUse {
                    quantity: parse_amount("quantity", &m.quantity)?,
                    item_id: m.item_id,
                })
            })
            .collect::<Result<Vec<_>, ClinicError>>()?;
        Ok(TreatmentInput {
            patient_id: input.patient_id,
            dentist_id: input.dentist_id,
            definition_id: input.definition_id,
            date: parse_date("date", &input.date)?,
            affected_teeth: parse_teeth(&input.affected_teeth)?,
            materials,
            notes: input.notes,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatmentRecord {
    pub id: String,
    pub treatment_name: String,
    pub date: String,
    pub material_cost: String,
    pub doctor_share: String,
    pub clinic_share: String,
    pub total_treatment_cost: String,
}

impl From<TreatmentRecord> for FfiTreatmentRecord {
    fn from(record: TreatmentRecord) -> Self {
        Self {
            id: record.id,
            treatment_name: record.treatment_name,
            date: record.date.to_string(),
            material_cost: record.material_cost.to_string(),
            doctor_share: record.doctor_share.to_string(),
            clinic_share: record.clinic_share.to_string(),
            total_treatment_cost: record.total_treatment_cost.to_string(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPaymentInput {
    pub patient_id: String,
    pub amount: String,
    /// Method variant name, e.g. "Cash"
    pub method: String,
    pub date: String,
    pub notes: Option<String>,
    pub acknowledge_duplicate: bool,
}

impl TryFrom<FfiPaymentInput> for PaymentInput {
    type Error = ClinicError;

    fn try_from(input: FfiPaymentInput) -> Result<Self, Self::Error> {
        Ok(PaymentInput {
            patient_id: input.patient_id,
            amount: parse_amount("amount", &input.amount)?,
            method: parse_enum("method", &input.method)?,
            date: parse_date("date", &input.date)?,
            notes: input.notes,
            acknowledge_duplicate: input.acknowledge_duplicate,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiscountInput {
    pub patient_id: String,
    pub amount: String,
    pub approver_id: String,
    pub reason: Option<String>,
    pub date: String,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPayment {
    pub id: String,
    pub amount: String,
    pub method: String,
    pub date: String,
}

impl From<Payment> for FfiPayment {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            amount: payment.amount.to_string(),
            method: format!("{:?}", payment.method),
            date: payment.date.to_string(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientLedger {
    pub total_charges: String,
    pub total_paid: String,
    pub total_discounts: String,
    pub outstanding: String,
}

impl From<PatientLedger> for FfiPatientLedger {
    fn from(ledger: PatientLedger) -> Self {
        Self {
            total_charges: ledger.total_charges.to_string(),
            total_paid: ledger.total_paid.to_string(),
            total_discounts: ledger.total_discounts.to_string(),
            outstanding: ledger.outstanding.to_string(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSupplierLedger {
    pub total_invoiced: String,
    pub total_paid: String,
    pub outstanding: String,
}

impl From<SupplierLedger> for FfiSupplierLedger {
    fn from(ledger: SupplierLedger) -> Self {
        Self {
            total_invoiced: ledger.total_invoiced.to_string(),
            total_paid: ledger.total_paid.to_string(),
            outstanding: ledger.outstanding.to_string(),
        }
    }
}
