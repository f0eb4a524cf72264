//! Disbursements to dentists.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::{log_failure, Clinic, ServiceError, ServiceResult, StaffService};
use crate::audit::{AuditEvent, AuditLog};
use crate::db::Repository;
use crate::ledger::DoctorLedger;
use crate::models::{AuditAction, DoctorPayment, TreatmentRecord};
use crate::validation::{currency_amount, optional_text, Confirmation, ValidationError};

/// Disbursement form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorPaymentInput {
    pub dentist_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub acknowledge_duplicate: bool,
}

pub struct DoctorPaymentService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> DoctorPaymentService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    /// Accrued share against disbursements for one dentist.
    pub fn ledger(&self, dentist_id: &str) -> ServiceResult<DoctorLedger> {
        let store = self.clinic.store();
        let records: Vec<TreatmentRecord> = store.list()?;
        let payments: Vec<DoctorPayment> = store.list_for(dentist_id)?;
        Ok(DoctorLedger::compute(dentist_id, &records, &payments))
    }

    /// Pay a dentist out of their outstanding share.
    pub fn pay(&self, input: DoctorPaymentInput) -> ServiceResult<DoctorPayment> {
        self.try_pay(input).inspect_err(|e| log_failure("doctor_payments.pay", e))
    }

    fn try_pay(&self, input: DoctorPaymentInput) -> ServiceResult<DoctorPayment> {
        let amount = currency_amount(input.amount, self.clinic.decimals())?;
        let date = self.clinic.check_date(input.date)?;
        let dentist = StaffService::new(self.clinic).require_dentist(&input.dentist_id)?;
        let duplicate_check = self.clinic.config().duplicate_payment_check;

        let payment = self.clinic.store().atomically(|store| {
            let records: Vec<TreatmentRecord> = store.list()?;
            let previous: Vec<DoctorPayment> = store.list_for(&dentist.id)?;
            let ledger = DoctorLedger::compute(&dentist.id, &records, &previous);

            if amount > ledger.outstanding {
                return Err(ValidationError::AmountExceedsBalance {
                    amount,
                    outstanding: ledger.outstanding,
                }
                .into());
            }

            let mut payment = DoctorPayment::new(dentist.id.clone(), amount, date);
            payment.notes = optional_text(input.notes.clone());
            if duplicate_check
                && !input.acknowledge_duplicate
                && previous.iter().any(|p| p.looks_like(&payment))
            {
                return Err(ValidationError::PossibleDuplicate { amount, date }.into());
            }

            store.add(&payment)?;
            Ok::<_, ServiceError>(payment)
        })?;

        info!(payment_id = %payment.id, dentist_id = %payment.dentist_id, amount = %payment.amount, "doctor paid");
        Ok(payment)
    }

    pub fn delete(&self, payment_id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        self.try_delete(payment_id, actor_id, confirmation)
            .inspect_err(|e| log_failure("doctor_payments.delete", e))
    }

    fn try_delete(&self, payment_id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        confirmation.require()?;
        self.clinic.store().atomically(|store| {
            let payment: DoctorPayment = store.require(payment_id)?;
            store.delete::<DoctorPayment>(payment_id)?;
            AuditLog::new(store).append(
                AuditEvent::new(actor_id, AuditAction::DoctorPaymentDeleted, payment_id)
                    .amount(payment.amount),
            )?;
            Ok::<_, ServiceError>(())
        })?;
        info!(payment_id, "doctor payment deleted");
        Ok(())
    }

    pub fn for_dentist(&self, dentist_id: &str) -> ServiceResult<Vec<DoctorPayment>> {
        let mut payments: Vec<DoctorPayment> = self.clinic.store().list_for(dentist_id)?;
        payments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(payments)
    }
}
