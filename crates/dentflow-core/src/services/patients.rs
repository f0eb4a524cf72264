//! Patient intake, search, chart editing and attachments.

use chrono::{NaiveDate, NaiveDateTime};
use strsim::{jaro_winkler, normalized_levenshtein};
use tracing::{error, info};

use super::{log_failure, Clinic, ServiceError, ServiceResult};
use crate::audit::{AuditEvent, AuditLog};
use crate::chart::{apply_bulk, ChartEditor};
use crate::db::Repository;
use crate::ledger::PatientLedger;
use crate::messaging::{message_link, render_template, TemplateContext};
use crate::models::{
    Appointment, Attachment, AuditAction, DentalChart, LabCase, Patient, Payment, Prescription,
    ToothId, ToothStatus, TreatmentRecord,
};
use crate::storage::patient_attachment_path;
use crate::validation::{optional_text, required_text, Confirmation};

/// Minimum fuzzy score for a name match.
const NAME_MATCH_THRESHOLD: f64 = 0.8;

/// Intake/edit form fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub allergies: Vec<String>,
    pub notes: Option<String>,
}

/// Patient operations.
pub struct PatientService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> PatientService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    /// Register a new patient.
    pub fn create(&self, input: PatientInput) -> ServiceResult<Patient> {
        self.try_create(input)
            .inspect_err(|e| log_failure("patients.create", e))
    }

    fn try_create(&self, input: PatientInput) -> ServiceResult<Patient> {
        let mut patient = Patient::new(String::new());
        self.apply_input(&mut patient, input)?;

        self.clinic.store().add(&patient)?;
        info!(patient_id = %patient.id, "patient created");
        Ok(patient)
    }

    /// Replace the demographic fields of a patient. Chart, attachments and
    /// visit history are kept.
    pub fn update(&self, id: &str, input: PatientInput) -> ServiceResult<Patient> {
        self.try_update(id, input)
            .inspect_err(|e| log_failure("patients.update", e))
    }

    fn try_update(&self, id: &str, input: PatientInput) -> ServiceResult<Patient> {
        let mut patient: Patient = self.clinic.store().require(id)?;
        self.apply_input(&mut patient, input)?;
        patient.touch();

        self.clinic.store().update(&patient)?;
        info!(patient_id = %patient.id, "patient updated");
        Ok(patient)
    }

    fn apply_input(&self, patient: &mut Patient, input: PatientInput) -> ServiceResult<()> {
        patient.name = required_text(&input.name, "name")?;
        patient.phone = clean_phone(input.phone);
        patient.email = optional_text(input.email);
        patient.date_of_birth = input
            .date_of_birth
            .map(|dob| self.clinic.check_date(dob))
            .transpose()?;
        patient.gender = optional_text(input.gender);
        patient.address = optional_text(input.address);
        patient.medical_history = optional_text(input.medical_history);
        patient.allergies = input
            .allergies
            .into_iter()
            .filter_map(|a| optional_text(Some(a)))
            .collect();
        patient.notes = optional_text(input.notes);
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<Option<Patient>> {
        Ok(self.clinic.store().get(id)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<Patient>> {
        Ok(self.clinic.store().list()?)
    }

    /// Delete a patient and everything recorded against them.
    pub fn delete(&self, id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        self.try_delete(id, actor_id, confirmation)
            .inspect_err(|e| log_failure("patients.delete", e))
    }

    fn try_delete(&self, id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        confirmation.require()?;
        let patient: Patient = self.clinic.store().require(id)?;

        let removed = self.clinic.store().atomically(|store| {
            let mut removed = 0;
            removed += delete_owned::<S, Appointment>(store, id)?;
            removed += delete_owned::<S, TreatmentRecord>(store, id)?;
            removed += delete_owned::<S, Payment>(store, id)?;
            removed += delete_owned::<S, Prescription>(store, id)?;
            removed += delete_owned::<S, LabCase>(store, id)?;
            store.delete::<Patient>(id)?;

            AuditLog::new(store).append(
                AuditEvent::new(actor_id, AuditAction::PatientDeleted, id).patient(id),
            )?;
            Ok::<_, ServiceError>(removed)
        })?;

        info!(patient_id = %patient.id, related = removed, "patient deleted");
        Ok(())
    }

    /// Find patients by name (fuzzy) or phone digits. Best matches first.
    pub fn search(&self, query: &str, limit: usize) -> ServiceResult<Vec<Patient>> {
        let query = query.trim().to_lowercase();
        let mut patients = self.list()?;
        if query.is_empty() {
            patients.sort_by(|a, b| a.name.cmp(&b.name));
            patients.truncate(limit);
            return Ok(patients);
        }

        let mut scored: Vec<(f64, Patient)> = patients
            .into_iter()
            .filter_map(|p| match_score(&query, &p).map(|score| (score, p)))
            .collect();
        scored.sort_by(|(sa, a), (sb, b)| sb.total_cmp(sa).then_with(|| a.name.cmp(&b.name)));

        Ok(scored.into_iter().take(limit).map(|(_, p)| p).collect())
    }

    /// Chart with every position present, for display.
    pub fn display_chart(&self, id: &str) -> ServiceResult<DentalChart> {
        let patient: Patient = self.clinic.store().require(id)?;
        Ok(patient.dental_chart.with_defaults())
    }

    /// Set status and notes of one tooth.
    pub fn edit_tooth(
        &self,
        id: &str,
        tooth: ToothId,
        status: ToothStatus,
        notes: &str,
    ) -> ServiceResult<Patient> {
        let mut patient: Patient = self.clinic.store().require(id)?;
        let mut editor = ChartEditor::open(&patient.dental_chart);
        editor.edit_tooth(tooth, status, notes);
        patient.dental_chart = editor.into_chart();
        patient.touch();

        self.clinic.store().update(&patient)?;
        info!(patient_id = %patient.id, tooth = %tooth, status = status.as_str(), "tooth updated");
        Ok(patient)
    }

    /// Apply one status and notes to several teeth.
    pub fn bulk_edit_teeth(
        &self,
        id: &str,
        teeth: &[ToothId],
        status: ToothStatus,
        notes: &str,
    ) -> ServiceResult<Patient> {
        let mut patient: Patient = self.clinic.store().require(id)?;
        patient.dental_chart = apply_bulk(&patient.dental_chart, teeth, status, notes);
        patient.touch();

        self.clinic.store().update(&patient)?;
        info!(patient_id = %patient.id, count = teeth.len(), status = status.as_str(), "teeth updated");
        Ok(patient)
    }

    /// Upload a file and attach it to the patient.
    pub fn upload_attachment(
        &self,
        id: &str,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> ServiceResult<Attachment> {
        self.try_upload(id, file_name, bytes, content_type)
            .inspect_err(|e| log_failure("patients.upload_attachment", e))
    }

    fn try_upload(
        &self,
        id: &str,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> ServiceResult<Attachment> {
        let name = required_text(file_name, "file_name")?;
        let mut patient: Patient = self.clinic.store().require(id)?;
        let files = self.clinic.file_store()?;

        let path = patient_attachment_path(&patient.id, &name);
        let url = files.upload(&path, bytes, content_type).map_err(|e| {
            error!(patient_id = %patient.id, path = %path, "attachment upload failed: {e}");
            e
        })?;

        let attachment = Attachment {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            url,
            content_type: optional_text(Some(content_type.to_string())),
            uploaded_at: chrono::Utc::now().to_rfc3339(),
        };
        patient.attachments.push(attachment.clone());
        patient.touch();
        self.clinic.store().update(&patient)?;

        info!(patient_id = %patient.id, attachment_id = %attachment.id, "attachment uploaded");
        Ok(attachment)
    }

    /// Detach a file reference. The stored file itself is left in place.
    pub fn remove_attachment(
        &self,
        id: &str,
        attachment_id: &str,
        confirmation: Confirmation,
    ) -> ServiceResult<bool> {
        confirmation.require()?;
        let mut patient: Patient = self.clinic.store().require(id)?;
        let before = patient.attachments.len();
        patient.attachments.retain(|a| a.id != attachment_id);
        if patient.attachments.len() == before {
            return Ok(false);
        }
        patient.touch();
        self.clinic.store().update(&patient)?;
        info!(patient_id = %patient.id, attachment_id, "attachment removed");
        Ok(true)
    }

    /// Current balance from the patient's records.
    pub fn ledger(&self, id: &str) -> ServiceResult<PatientLedger> {
        let store = self.clinic.store();
        store.require::<Patient>(id)?;
        let records: Vec<TreatmentRecord> = store.list_for(id)?;
        let payments: Vec<Payment> = store.list_for(id)?;
        Ok(PatientLedger::compute(&records, &payments))
    }

    /// Messaging link for the patient, using `template` or the configured default.
    pub fn message_link(
        &self,
        id: &str,
        template: Option<&str>,
        appointment: Option<NaiveDateTime>,
    ) -> ServiceResult<String> {
        let patient: Patient = self.clinic.store().require(id)?;
        let config = self.clinic.config();
        let phone = patient.phone.as_deref().unwrap_or_default();

        let text = render_template(
            template.unwrap_or(&config.messaging.default_template),
            &TemplateContext {
                patient_name: &patient.name,
                clinic: Some(&config.clinic),
                appointment,
            },
        );
        let url = message_link(&config.messaging, phone, &text)
            .map_err(ServiceError::from)
            .inspect_err(|e| log_failure("patients.message_link", e))?;
        Ok(url.into())
    }
}

fn delete_owned<S: Repository, T: crate::db::Entity>(store: &S, owner_id: &str) -> ServiceResult<usize> {
    let owned: Vec<T> = store.list_for(owner_id)?;
    for entity in &owned {
        store.delete::<T>(entity.id())?;
    }
    Ok(owned.len())
}

/// Keep digits and a leading `+`; blank becomes `None`.
fn clean_phone(raw: Option<String>) -> Option<String> {
    let raw = optional_text(raw)?;
    let mut cleaned = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        if c.is_ascii_digit() || (i == 0 && c == '+') {
            cleaned.push(c);
        }
    }
    cleaned.chars().any(|c| c.is_ascii_digit()).then_some(cleaned)
}

/// Score a patient against a lowercase query, or `None` for no match.
fn match_score(query: &str, patient: &Patient) -> Option<f64> {
    let digits: String = query.chars().filter(char::is_ascii_digit).collect();
    let looks_like_phone = !digits.is_empty() && digits.len() * 2 >= query.len();

    if looks_like_phone {
        let phone: String = patient
            .phone
            .as_deref()
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let local = digits.trim_start_matches('0');
        return (!local.is_empty() && phone.contains(local)).then_some(1.0);
    }

    let name = patient.name.to_lowercase();
    if name.contains(query) {
        return Some(1.0);
    }
    let best = name
        .split_whitespace()
        .chain(std::iter::once(name.as_str()))
        .map(|token| fuzzy_match(query, token))
        .fold(0.0_f64, f64::max);
    (best >= NAME_MATCH_THRESHOLD).then_some(best)
}

/// Jaro-Winkler weighted over normalized Levenshtein.
fn fuzzy_match(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}
