//! Supplier and lab balances.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Expense, SupplierInvoice};

/// Remaining balance of one invoice: amount − Σ invoice payments.
pub fn invoice_balance(invoice: &SupplierInvoice) -> Decimal {
    invoice.amount - invoice.paid()
}

/// Amount a "pay remaining" action would settle, or `None` when the invoice
/// is already fully paid.
pub fn remaining_payment(invoice: &SupplierInvoice) -> Option<Decimal> {
    let balance = invoice_balance(invoice);
    (balance > Decimal::ZERO).then_some(balance)
}

/// A supplier's position as of the records supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SupplierLedger {
    /// Σ invoice amounts
    pub total_invoiced: Decimal,
    /// Σ linked payments
    pub total_paid: Decimal,
    /// total_invoiced − total_paid
    pub outstanding: Decimal,
}

impl SupplierLedger {
    /// Compute a supplier's outstanding balance.
    ///
    /// A payment is linked when it is an expense tagged with the supplier, or
    /// an invoice payment on one of the supplier's invoices. An invoice payment
    /// referencing an expense is the same money as that expense and is counted
    /// once; invoice payments without an expense are counted directly. An
    /// expense tagged with a different supplier belongs to that supplier's
    /// ledger, so an invoice payment pointing at it is not counted here.
    pub fn compute(supplier_id: &str, invoices: &[SupplierInvoice], expenses: &[Expense]) -> Self {
        let invoices: Vec<&SupplierInvoice> = invoices
            .iter()
            .filter(|i| i.supplier_id == supplier_id)
            .collect();

        let total_invoiced: Decimal = invoices.iter().map(|i| i.amount).sum();

        let mut linked_expenses: HashSet<&str> = expenses
            .iter()
            .filter(|e| e.supplier_id.as_deref() == Some(supplier_id))
            .map(|e| e.id.as_str())
            .collect();

        let mut unlinked_invoice_payments = Decimal::ZERO;
        for payment in invoices.iter().flat_map(|i| i.payments.iter()) {
            let referenced = payment
                .expense_id
                .as_deref()
                .and_then(|id| expenses.iter().find(|e| e.id == id));
            match referenced {
                Some(expense) if expense.supplier_id.as_deref().map_or(true, |s| s == supplier_id) => {
                    linked_expenses.insert(expense.id.as_str());
                }
                Some(_) => {}
                None => unlinked_invoice_payments += payment.amount,
            }
        }

        let expense_total: Decimal = expenses
            .iter()
            .filter(|e| linked_expenses.contains(e.id.as_str()))
            .map(|e| e.amount)
            .sum();

        let total_paid = expense_total + unlinked_invoice_payments;
        Self {
            total_invoiced,
            total_paid,
            outstanding: total_invoiced - total_paid,
        }
    }
}
