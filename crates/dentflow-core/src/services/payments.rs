//! Patient payments and discounts.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::{log_failure, Clinic, ServiceError, ServiceResult};
use crate::audit::{AuditEvent, AuditLog};
use crate::db::Repository;
use crate::discount::{discount_payment, validate_discount, DiscountRequest};
use crate::ledger::PatientLedger;
use crate::models::{AuditAction, Patient, Payment, PaymentMethod, StaffMember, TreatmentRecord};
use crate::validation::{currency_amount, optional_text, within_precision, Confirmation, ValidationError};

/// Payment form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInput {
    pub patient_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    pub notes: Option<String>,
    /// The user saw the duplicate warning and wants to proceed
    pub acknowledge_duplicate: bool,
}

pub struct PaymentService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> PaymentService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    /// Record money received from a patient.
    pub fn add(&self, input: PaymentInput) -> ServiceResult<Payment> {
        self.try_add(input).inspect_err(|e| log_failure("payments.add", e))
    }

    fn try_add(&self, input: PaymentInput) -> ServiceResult<Payment> {
        if input.method.is_discount() {
            return Err(ValidationError::DiscountRequiresApproval.into());
        }
        let amount = currency_amount(input.amount, self.clinic.decimals())?;
        let date = self.clinic.check_date(input.date)?;
        let config = self.clinic.config();

        let payment = self.clinic.store().atomically(|store| {
            let patient: Patient = store.require(&input.patient_id)?;
            let payments: Vec<Payment> = store.list_for(&patient.id)?;
            let records: Vec<TreatmentRecord> = store.list_for(&patient.id)?;
            let ledger = PatientLedger::compute(&records, &payments);

            if !config.allow_overpayment && amount > ledger.outstanding {
                return Err(ValidationError::AmountExceedsBalance {
                    amount,
                    outstanding: ledger.outstanding,
                }
                .into());
            }

            let mut payment = Payment::new(patient.id.clone(), amount, input.method, date);
            payment.notes = optional_text(input.notes.clone());

            if config.duplicate_payment_check
                && !input.acknowledge_duplicate
                && payments.iter().any(|p| p.looks_like(&payment))
            {
                return Err(ValidationError::PossibleDuplicate { amount, date }.into());
            }

            store.add(&payment)?;
            Ok::<_, ServiceError>(payment)
        })?;

        info!(
            payment_id = %payment.id,
            patient_id = %payment.patient_id,
            amount = %payment.amount,
            method = ?payment.method,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Write down a patient's balance with an approver's sign-off.
    pub fn apply_discount(&self, request: DiscountRequest) -> ServiceResult<Payment> {
        self.try_apply_discount(request)
            .inspect_err(|e| log_failure("payments.apply_discount", e))
    }

    fn try_apply_discount(&self, mut request: DiscountRequest) -> ServiceResult<Payment> {
        request.date = self.clinic.check_date(request.date)?;
        within_precision(request.amount, self.clinic.decimals())?;
        let config = self.clinic.config();

        let payment = self.clinic.store().atomically(|store| {
            let approver: StaffMember = store.require(&request.approver_id)?;
            let patient: Patient = store.require(&request.patient_id)?;
            let ledger = PatientLedger::compute(
                &store.list_for::<TreatmentRecord>(&patient.id)?,
                &store.list_for::<Payment>(&patient.id)?,
            );

            validate_discount(&request, ledger.outstanding, &approver, config)?;

            let payment = discount_payment(&request);
            store.add(&payment)?;
            AuditLog::new(store).append(
                AuditEvent::new(&approver.id, AuditAction::DiscountApproved, &payment.id)
                    .patient(&patient.id)
                    .amount(payment.amount)
                    .reason(request.reason.as_deref()),
            )?;
            Ok::<_, ServiceError>(payment)
        })?;

        info!(
            payment_id = %payment.id,
            patient_id = %payment.patient_id,
            amount = %payment.amount,
            approved_by = ?payment.approved_by,
            "discount applied"
        );
        Ok(payment)
    }

    pub fn delete(&self, payment_id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        self.try_delete(payment_id, actor_id, confirmation)
            .inspect_err(|e| log_failure("payments.delete", e))
    }

    fn try_delete(&self, payment_id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        confirmation.require()?;
        self.clinic.store().atomically(|store| {
            let payment: Payment = store.require(payment_id)?;
            store.delete::<Payment>(payment_id)?;
            AuditLog::new(store).append(
                AuditEvent::new(actor_id, AuditAction::PaymentDeleted, payment_id)
                    .patient(&payment.patient_id)
                    .amount(payment.amount),
            )?;
            Ok::<_, ServiceError>(())
        })?;
        info!(payment_id, "payment deleted");
        Ok(())
    }

    /// A patient's payments, most recent first.
    pub fn for_patient(&self, patient_id: &str) -> ServiceResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self.clinic.store().list_for(patient_id)?;
        payments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(payments)
    }
}
