//! Payment, disbursement and expense models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a patient payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Insurance,
    /// Balance write-down, not cash received
    Discount,
    Other,
}

impl PaymentMethod {
    pub fn is_discount(&self) -> bool {
        matches!(self, PaymentMethod::Discount)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::Insurance => "insurance",
            PaymentMethod::Discount => "discount",
            PaymentMethod::Other => "other",
        }
    }
}

/// An amount applied against a patient's balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: String,
    pub patient_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub date: NaiveDate,
    pub notes: Option<String>,
    /// Staff member who approved a discount
    #[serde(default)]
    pub approved_by: Option<String>,
    pub created_at: String,
}

impl Payment {
    /// Create a new payment.
    pub fn new(patient_id: String, amount: Decimal, method: PaymentMethod, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            amount,
            method,
            date,
            notes: None,
            approved_by: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Heuristic duplicate check: same patient, date and amount.
    pub fn looks_like(&self, other: &Payment) -> bool {
        self.patient_id == other.patient_id
            && self.date == other.date
            && self.amount == other.amount
    }
}

/// Disbursement to a dentist against accrued doctor share.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorPayment {
    pub id: String,
    pub dentist_id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: String,
}

impl DoctorPayment {
    pub fn new(dentist_id: String, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            dentist_id,
            amount,
            date,
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn looks_like(&self, other: &DoctorPayment) -> bool {
        self.dentist_id == other.dentist_id
            && self.date == other.date
            && self.amount == other.amount
    }
}

/// Money paid out by the clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    /// Free category (e.g., "rent", "supplies", "lab")
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Supplier this expense pays, if any
    pub supplier_id: Option<String>,
    /// Supplier invoice this expense settles, if any
    pub invoice_id: Option<String>,
    pub created_at: String,
}

impl Expense {
    pub fn new(category: String, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            description: None,
            amount,
            date,
            supplier_id: None,
            invoice_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
