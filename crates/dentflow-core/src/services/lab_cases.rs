//! Dental lab work orders.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::{log_failure, Clinic, ServiceResult};
use crate::db::Repository;
use crate::models::{LabCase, LabCaseStatus, Patient, Supplier, ToothId};
use crate::validation::{non_negative_amount, optional_text, required_text, within_precision, ValidationError};

/// Lab case form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LabCaseInput {
    pub patient_id: String,
    pub supplier_id: String,
    pub dentist_id: Option<String>,
    pub case_type: String,
    pub teeth: Vec<ToothId>,
    pub shade: Option<String>,
    pub cost: Decimal,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

pub struct LabCaseService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> LabCaseService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    /// Open a case in `Draft`.
    pub fn create(&self, input: LabCaseInput) -> ServiceResult<LabCase> {
        self.try_create(input)
            .inspect_err(|e| log_failure("lab_cases.create", e))
    }

    fn try_create(&self, input: LabCaseInput) -> ServiceResult<LabCase> {
        let case_type = required_text(&input.case_type, "case_type")?;
        non_negative_amount(input.cost)?;
        within_precision(input.cost, self.clinic.decimals())?;
        let store = self.clinic.store();
        store.require::<Patient>(&input.patient_id)?;
        let supplier: Supplier = store.require(&input.supplier_id)?;
        if !supplier.is_lab() {
            return Err(ValidationError::NotALab(supplier.name).into());
        }

        let mut case = LabCase::new(input.patient_id, supplier.id, case_type, input.cost);
        case.dentist_id = optional_text(input.dentist_id);
        case.teeth = input.teeth;
        case.shade = optional_text(input.shade);
        case.due_date = input.due_date;
        case.notes = optional_text(input.notes);

        store.add(&case)?;
        info!(case_id = %case.id, patient_id = %case.patient_id, "lab case created");
        Ok(case)
    }

    /// Move a case along its lifecycle, stamping the date of the step.
    pub fn transition(&self, id: &str, next: LabCaseStatus, date: NaiveDate) -> ServiceResult<LabCase> {
        self.try_transition(id, next, date)
            .inspect_err(|e| log_failure("lab_cases.transition", e))
    }

    fn try_transition(&self, id: &str, next: LabCaseStatus, date: NaiveDate) -> ServiceResult<LabCase> {
        let date = self.clinic.check_date(date)?;
        let mut case: LabCase = self.clinic.store().require(id)?;
        if !case.status.can_transition_to(next) {
            return Err(ValidationError::InvalidTransition {
                from: case.status,
                to: next,
            }
            .into());
        }

        match next {
            LabCaseStatus::Sent => case.sent_date = Some(date),
            LabCaseStatus::Received => case.received_date = Some(date),
            LabCaseStatus::Fitted => case.fitted_date = Some(date),
            LabCaseStatus::Draft | LabCaseStatus::Cancelled => {}
        }
        let from = case.status;
        case.status = next;

        self.clinic.store().update(&case)?;
        info!(case_id = %case.id, from = ?from, to = ?next, "lab case moved");
        Ok(case)
    }

    pub fn for_patient(&self, patient_id: &str) -> ServiceResult<Vec<LabCase>> {
        Ok(self.clinic.store().list_for(patient_id)?)
    }

    /// Cases not yet fitted or cancelled.
    pub fn open_cases(&self) -> ServiceResult<Vec<LabCase>> {
        let cases: Vec<LabCase> = self.clinic.store().list()?;
        Ok(cases.into_iter().filter(|c| !c.status.is_terminal()).collect())
    }

    /// Sent cases past their due date.
    pub fn late_cases(&self) -> ServiceResult<Vec<LabCase>> {
        let today = self.clinic.today();
        Ok(self.open_cases()?.into_iter().filter(|c| c.is_late(today)).collect())
    }
}
