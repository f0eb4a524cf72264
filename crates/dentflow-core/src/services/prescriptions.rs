//! Prescriptions.

use chrono::NaiveDate;
use tracing::info;

use super::{log_failure, Clinic, ServiceResult, StaffService};
use crate::db::Repository;
use crate::models::{Patient, Prescription, PrescriptionItem};
use crate::validation::{optional_text, required_text, Confirmation, ValidationError};

/// Prescription form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescriptionInput {
    pub patient_id: String,
    pub dentist_id: String,
    pub date: NaiveDate,
    pub items: Vec<PrescriptionItem>,
    pub notes: Option<String>,
}

pub struct PrescriptionService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> PrescriptionService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    pub fn create(&self, input: PrescriptionInput) -> ServiceResult<Prescription> {
        self.try_create(input)
            .inspect_err(|e| log_failure("prescriptions.create", e))
    }

    fn try_create(&self, input: PrescriptionInput) -> ServiceResult<Prescription> {
        if input.items.is_empty() {
            return Err(ValidationError::MissingField("items").into());
        }
        let items = input
            .items
            .into_iter()
            .map(clean_item)
            .collect::<Result<Vec<_>, _>>()?;
        let date = self.clinic.check_date(input.date)?;

        self.clinic.store().require::<Patient>(&input.patient_id)?;
        let dentist = StaffService::new(self.clinic).require_dentist(&input.dentist_id)?;

        let mut prescription = Prescription::new(input.patient_id, dentist.id, date);
        prescription.items = items;
        prescription.notes = optional_text(input.notes);

        self.clinic.store().add(&prescription)?;
        info!(
            prescription_id = %prescription.id,
            patient_id = %prescription.patient_id,
            items = prescription.items.len(),
            "prescription written"
        );
        Ok(prescription)
    }

    pub fn delete(&self, id: &str, confirmation: Confirmation) -> ServiceResult<bool> {
        confirmation.require()?;
        let removed = self.clinic.store().delete::<Prescription>(id)?;
        if removed {
            info!(prescription_id = id, "prescription deleted");
        }
        Ok(removed)
    }

    /// A patient's prescriptions, most recent first.
    pub fn for_patient(&self, patient_id: &str) -> ServiceResult<Vec<Prescription>> {
        let mut prescriptions: Vec<Prescription> = self.clinic.store().list_for(patient_id)?;
        prescriptions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(prescriptions)
    }
}

fn clean_item(item: PrescriptionItem) -> Result<PrescriptionItem, ValidationError> {
    Ok(PrescriptionItem {
        medication: required_text(&item.medication, "medication")?,
        dosage: required_text(&item.dosage, "dosage")?,
        frequency: optional_text(item.frequency),
        duration: optional_text(item.duration),
        instructions: optional_text(item.instructions),
    })
}
