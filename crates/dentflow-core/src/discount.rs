//! Discount authorization.
//!
//! A discount is a balance write-down recorded as a [`PaymentMethod::Discount`]
//! payment. It needs an approver whose role is allowed by configuration.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::ClinicConfig;
use crate::models::{Payment, PaymentMethod, StaffMember};

/// Reasons a discount is refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscountError {
    #[error("discount amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("patient has no outstanding balance")]
    NoOutstandingBalance,

    #[error("discount {amount} exceeds outstanding balance {outstanding}")]
    ExceedsBalance { amount: Decimal, outstanding: Decimal },

    #[error("staff member {staff_id} may not approve discounts")]
    NotAuthorized { staff_id: String },
}

impl DiscountError {
    pub fn message_key(&self) -> &'static str {
        match self {
            DiscountError::NonPositiveAmount(_) => "discount.non_positive_amount",
            DiscountError::NoOutstandingBalance => "discount.no_outstanding_balance",
            DiscountError::ExceedsBalance { .. } => "discount.exceeds_balance",
            DiscountError::NotAuthorized { .. } => "discount.not_authorized",
        }
    }
}

/// A requested write-down.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountRequest {
    pub patient_id: String,
    pub amount: Decimal,
    pub approver_id: String,
    pub reason: Option<String>,
    pub date: NaiveDate,
}

/// Check a discount against the patient's outstanding balance and the
/// approver's role. Checks run in a fixed order so each failure is distinct.
pub fn validate_discount(
    request: &DiscountRequest,
    outstanding: Decimal,
    approver: &StaffMember,
    config: &ClinicConfig,
) -> Result<(), DiscountError> {
    if request.amount <= Decimal::ZERO {
        return Err(DiscountError::NonPositiveAmount(request.amount));
    }
    if outstanding <= Decimal::ZERO {
        return Err(DiscountError::NoOutstandingBalance);
    }
    if request.amount > outstanding {
        return Err(DiscountError::ExceedsBalance {
            amount: request.amount,
            outstanding,
        });
    }
    if !approver.active || !config.can_approve_discounts(approver.role) {
        return Err(DiscountError::NotAuthorized {
            staff_id: approver.id.clone(),
        });
    }
    Ok(())
}

/// Payment record for an approved discount.
pub fn discount_payment(request: &DiscountRequest) -> Payment {
    let mut payment = Payment::new(
        request.patient_id.clone(),
        request.amount,
        PaymentMethod::Discount,
        request.date,
    );
    payment.approved_by = Some(request.approver_id.clone());
    payment.notes = request.reason.clone();
    payment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StaffRole;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal, approver: &StaffMember) -> DiscountRequest {
        DiscountRequest {
            patient_id: "p1".into(),
            amount,
            approver_id: approver.id.clone(),
            reason: Some("loyalty".into()),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    fn owner() -> StaffMember {
        StaffMember::new("Dr. Hany".into(), StaffRole::Owner)
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let approver = owner();
        let err = validate_discount(&request(dec!(0), &approver), dec!(500), &approver, &ClinicConfig::default());
        assert_eq!(err, Err(DiscountError::NonPositiveAmount(dec!(0))));
    }

    #[test]
    fn test_rejects_without_balance() {
        let approver = owner();
        let err = validate_discount(&request(dec!(50), &approver), dec!(0), &approver, &ClinicConfig::default());
        assert_eq!(err, Err(DiscountError::NoOutstandingBalance));

        let err = validate_discount(&request(dec!(50), &approver), dec!(-20), &approver, &ClinicConfig::default());
        assert_eq!(err, Err(DiscountError::NoOutstandingBalance));
    }

    #[test]
    fn test_rejects_amount_over_balance() {
        let approver = owner();
        let err = validate_discount(&request(dec!(501), &approver), dec!(500), &approver, &ClinicConfig::default());
        assert_eq!(
            err,
            Err(DiscountError::ExceedsBalance {
                amount: dec!(501),
                outstanding: dec!(500)
            })
        );
    }

    #[test]
    fn test_rejects_unauthorized_approver() {
        let approver = StaffMember::new("Front desk".into(), StaffRole::Receptionist);
        let err = validate_discount(&request(dec!(100), &approver), dec!(500), &approver, &ClinicConfig::default());
        assert!(matches!(err, Err(DiscountError::NotAuthorized { .. })));
        assert_eq!(err.unwrap_err().message_key(), "discount.not_authorized");

        let mut retired = owner();
        retired.active = false;
        let err = validate_discount(&request(dec!(100), &retired), dec!(500), &retired, &ClinicConfig::default());
        assert!(matches!(err, Err(DiscountError::NotAuthorized { .. })));
    }

    #[test]
    fn test_accepts_full_balance() {
        let approver = owner();
        let req = request(dec!(500), &approver);
        assert!(validate_discount(&req, dec!(500), &approver, &ClinicConfig::default()).is_ok());

        let payment = discount_payment(&req);
        assert_eq!(payment.method, PaymentMethod::Discount);
        assert_eq!(payment.approved_by.as_deref(), Some(approver.id.as_str()));
    }
}
