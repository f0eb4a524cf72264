//! Supplier, invoice and lab case models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::chart::ToothId;

/// Kind of supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplierKind {
    /// Consumables and equipment
    Materials,
    /// Dental laboratory (crowns, bridges, dentures)
    DentalLab,
    Services,
    Other,
}

/// A supplier the clinic buys from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub kind: SupplierKind,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Supplier {
    pub fn new(name: String, kind: SupplierKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            kind,
            contact_name: None,
            phone: None,
            email: None,
            address: None,
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_lab(&self) -> bool {
        self.kind == SupplierKind::DentalLab
    }
}

/// A billed line on a supplier invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Inventory item restocked by this line, if any
    #[serde(default)]
    pub inventory_item_id: Option<String>,
}

impl InvoiceLineItem {
    pub fn total(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// A payment recorded against one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoicePayment {
    pub id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Expense that carried the money, if one was recorded
    pub expense_id: Option<String>,
}

/// An invoice billed by a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierInvoice {
    pub id: String,
    pub supplier_id: String,
    pub invoice_number: Option<String>,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub amount: Decimal,
    #[serde(default)]
    pub items: Vec<InvoiceLineItem>,
    #[serde(default)]
    pub payments: Vec<InvoicePayment>,
    /// URL of an uploaded scan of the paper invoice
    pub scan_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl SupplierInvoice {
    pub fn new(supplier_id: String, amount: Decimal, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            supplier_id,
            invoice_number: None,
            date,
            due_date: None,
            amount,
            items: Vec::new(),
            payments: Vec::new(),
            scan_url: None,
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Sum of line item totals.
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(InvoiceLineItem::total).sum()
    }

    /// Sum of payments recorded against this invoice.
    pub fn paid(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today) && self.paid() < self.amount
    }
}

/// Lab case lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabCaseStatus {
    Draft,
    Sent,
    Received,
    Fitted,
    Cancelled,
}

impl LabCaseStatus {
    /// Check whether moving to `next` is allowed.
    pub fn can_transition_to(self, next: LabCaseStatus) -> bool {
        use LabCaseStatus::*;
        matches!(
            (self, next),
            (Draft, Sent) | (Sent, Received) | (Received, Fitted)
        ) || (next == Cancelled && !self.is_terminal())
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, LabCaseStatus::Fitted | LabCaseStatus::Cancelled)
    }
}

/// A dental-lab work order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabCase {
    pub id: String,
    pub patient_id: String,
    /// Supplier of kind [`SupplierKind::DentalLab`]
    pub supplier_id: String,
    pub dentist_id: Option<String>,
    /// Work type (e.g., "zirconia crown", "night guard")
    pub case_type: String,
    #[serde(default)]
    pub teeth: Vec<ToothId>,
    pub shade: Option<String>,
    pub cost: Decimal,
    pub status: LabCaseStatus,
    pub sent_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub fitted_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl LabCase {
    pub fn new(patient_id: String, supplier_id: String, case_type: String, cost: Decimal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            supplier_id,
            dentist_id: None,
            case_type,
            teeth: Vec::new(),
            shade: None,
            cost,
            status: LabCaseStatus::Draft,
            sent_date: None,
            due_date: None,
            received_date: None,
            fitted_date: None,
            notes: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_late(&self, today: NaiveDate) -> bool {
        self.status == LabCaseStatus::Sent && self.due_date.is_some_and(|due| due < today)
    }
}
