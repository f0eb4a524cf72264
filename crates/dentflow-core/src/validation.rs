//! Input validation failures.
//!
//! Every variant is non-fatal: the caller shows a notification and keeps the
//! form open. [`ValidationError::message_key`] gives a stable key for the
//! external string catalog.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::LabCaseStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("amount must not be negative, got {0}")]
    NegativeAmount(Decimal),

    #[error("amount {amount} has more than {decimals} decimal places")]
    TooPrecise { amount: Decimal, decimals: u32 },

    #[error("amount {amount} exceeds outstanding balance {outstanding}")]
    AmountExceedsBalance { amount: Decimal, outstanding: Decimal },

    #[error("date {0} is in the future")]
    FutureDate(NaiveDate),

    #[error("end {end} must be after start {start}")]
    InvalidTimeRange { start: NaiveDateTime, end: NaiveDateTime },

    #[error("percentage {field} must be between 0 and 1, got {value}")]
    PercentageOutOfRange { field: &'static str, value: Decimal },

    #[error("a payment of {amount} on {date} already exists for this record")]
    PossibleDuplicate { amount: Decimal, date: NaiveDate },

    #[error("{count} overlapping appointment(s)")]
    ScheduleConflict { count: usize },

    #[error("insufficient stock for {item}: {available} available, {requested} requested")]
    InsufficientStock {
        item: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("invalid tooth id: {0}")]
    InvalidTooth(String),

    #[error("cannot move lab case from {from:?} to {to:?}")]
    InvalidTransition { from: LabCaseStatus, to: LabCaseStatus },

    #[error("invoice line items total {items_total} but invoice amount is {amount}")]
    InvoiceTotalMismatch { amount: Decimal, items_total: Decimal },

    #[error("nothing left to pay")]
    NothingToPay,

    #[error("{0} is not a dentist")]
    NotADentist(String),

    #[error("supplier {0} is not a dental lab")]
    NotALab(String),

    #[error("destructive action requires confirmation")]
    ConfirmationRequired,

    #[error("discounts must go through approval")]
    DiscountRequiresApproval,

    #[error("due date {due} is before issue date {issued}")]
    DueBeforeIssue { issued: NaiveDate, due: NaiveDate },
}

impl ValidationError {
    /// Stable key for the localized message catalog.
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "validation.missing_field",
            ValidationError::NonPositiveAmount(_) => "validation.non_positive_amount",
            ValidationError::NegativeAmount(_) => "validation.negative_amount",
            ValidationError::TooPrecise { .. } => "validation.too_precise",
            ValidationError::AmountExceedsBalance { .. } => "validation.amount_exceeds_balance",
            ValidationError::FutureDate(_) => "validation.future_date",
            ValidationError::InvalidTimeRange { .. } => "validation.invalid_time_range",
            ValidationError::PercentageOutOfRange { .. } => "validation.percentage_out_of_range",
            ValidationError::PossibleDuplicate { .. } => "validation.possible_duplicate",
            ValidationError::ScheduleConflict { .. } => "validation.schedule_conflict",
            ValidationError::InsufficientStock { .. } => "validation.insufficient_stock",
            ValidationError::InvalidTooth(_) => "validation.invalid_tooth",
            ValidationError::InvalidTransition { .. } => "validation.invalid_transition",
            ValidationError::InvoiceTotalMismatch { .. } => "validation.invoice_total_mismatch",
            ValidationError::NothingToPay => "validation.nothing_to_pay",
            ValidationError::NotADentist(_) => "validation.not_a_dentist",
            ValidationError::NotALab(_) => "validation.not_a_lab",
            ValidationError::ConfirmationRequired => "validation.confirmation_required",
            ValidationError::DiscountRequiresApproval => "validation.discount_requires_approval",
            ValidationError::DueBeforeIssue { .. } => "validation.due_before_issue",
        }
    }
}

/// Explicit user confirmation for destructive actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Pending,
    Confirmed,
}

impl Confirmation {
    pub fn require(self) -> Result<(), ValidationError> {
        match self {
            Confirmation::Confirmed => Ok(()),
            Confirmation::Pending => Err(ValidationError::ConfirmationRequired),
        }
    }
}

/// Trimmed, non-empty text or a `MissingField` error.
pub fn required_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// `None` for blank optional text, trimmed otherwise.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn positive_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    Ok(amount)
}

pub fn non_negative_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(amount)
}

/// Reject amounts finer than the currency's smallest unit.
pub fn within_precision(amount: Decimal, decimals: u32) -> Result<Decimal, ValidationError> {
    if amount.normalize().scale() > decimals {
        return Err(ValidationError::TooPrecise { amount, decimals });
    }
    Ok(amount)
}

/// A positive amount expressible in the currency's precision.
pub fn currency_amount(amount: Decimal, decimals: u32) -> Result<Decimal, ValidationError> {
    within_precision(positive_amount(amount)?, decimals)
}

pub fn not_in_future(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if date > today {
        return Err(ValidationError::FutureDate(date));
    }
    Ok(date)
}

pub fn fraction(value: Decimal, field: &'static str) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ValidationError::PercentageOutOfRange { field, value });
    }
    Ok(value)
}
