//! Supplier and lab statements of account.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{escape_csv, ReportHeader};
use crate::ledger::{invoice_balance, SupplierLedger};
use crate::models::{Expense, Supplier, SupplierInvoice, SupplierKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierStatement {
    pub header: ReportHeader,
    pub supplier_id: String,
    pub supplier_name: String,
    pub kind: SupplierKind,
    pub as_of: NaiveDate,
    pub invoices: Vec<StatementInvoice>,
    /// Expenses tagged with the supplier that settle no invoice
    pub direct_payments: Vec<StatementPayment>,
    pub ledger: SupplierLedger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementInvoice {
    pub invoice_id: String,
    pub invoice_number: Option<String>,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementPayment {
    pub date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
}

impl SupplierStatement {
    pub fn build(
        header: ReportHeader,
        supplier: &Supplier,
        invoices: &[SupplierInvoice],
        expenses: &[Expense],
        as_of: NaiveDate,
    ) -> Self {
        let mut lines: Vec<StatementInvoice> = invoices
            .iter()
            .filter(|i| i.supplier_id == supplier.id)
            .map(|i| StatementInvoice {
                invoice_id: i.id.clone(),
                invoice_number: i.invoice_number.clone(),
                date: i.date,
                due_date: i.due_date,
                amount: i.amount,
                paid: i.paid(),
                balance: invoice_balance(i),
                overdue: i.is_overdue(as_of),
            })
            .collect();
        lines.sort_by_key(|l| l.date);

        let mut direct_payments: Vec<StatementPayment> = expenses
            .iter()
            .filter(|e| e.supplier_id.as_deref() == Some(supplier.id.as_str()) && e.invoice_id.is_none())
            .map(|e| StatementPayment {
                date: e.date,
                category: e.category.clone(),
                description: e.description.clone(),
                amount: e.amount,
            })
            .collect();
        direct_payments.sort_by_key(|p| p.date);

        Self {
            header,
            supplier_id: supplier.id.clone(),
            supplier_name: supplier.name.clone(),
            kind: supplier.kind,
            as_of,
            invoices: lines,
            direct_payments,
            ledger: SupplierLedger::compute(&supplier.id, invoices, expenses),
        }
    }

    /// Sum of balances on overdue invoices.
    pub fn overdue_total(&self) -> Decimal {
        self.invoices
            .iter()
            .filter(|i| i.overdue)
            .map(|i| i.balance)
            .sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_csv(&self) -> String {
        let mut lines =
            vec!["invoice_number,date,due_date,amount,paid,balance,overdue".to_string()];

        for invoice in &self.invoices {
            lines.push(format!(
                "{},{},{},{},{},{},{}",
                escape_csv(invoice.invoice_number.as_deref().unwrap_or(&invoice.invoice_id)),
                invoice.date,
                invoice.due_date.map(|d| d.to_string()).unwrap_or_default(),
                invoice.amount,
                invoice.paid,
                invoice.balance,
                invoice.overdue
            ));
        }
        for payment in &self.direct_payments {
            lines.push(format!(
                "{},{},,,{},,",
                escape_csv(payment.description.as_deref().unwrap_or(&payment.category)),
                payment.date,
                payment.amount
            ));
        }
        lines.push(format!(
            "TOTAL,,,{},{},{},",
            self.ledger.total_invoiced, self.ledger.total_paid, self.ledger.outstanding
        ));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinicConfig;
    use crate::models::InvoicePayment;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[test]
    fn test_statement_balances_and_overdue() {
        let supplier = Supplier::new("Smile Lab".into(), SupplierKind::DentalLab);

        let mut overdue = SupplierInvoice::new(supplier.id.clone(), dec!(2000), day(1));
        overdue.invoice_number = Some("INV-7".into());
        overdue.due_date = Some(day(10));
        let mut paid_expense = Expense::new("lab".into(), dec!(500), day(5));
        paid_expense.supplier_id = Some(supplier.id.clone());
        paid_expense.invoice_id = Some(overdue.id.clone());
        overdue.payments.push(InvoicePayment {
            id: "p1".into(),
            amount: dec!(500),
            date: day(5),
            expense_id: Some(paid_expense.id.clone()),
        });

        let current = SupplierInvoice::new(supplier.id.clone(), dec!(300), day(18));

        let mut direct = Expense::new("lab".into(), dec!(100), day(12));
        direct.supplier_id = Some(supplier.id.clone());
        direct.description = Some("Shade guide, rush fee".into());

        let statement = SupplierStatement::build(
            ReportHeader::from_config(&ClinicConfig::default()),
            &supplier,
            &[overdue, current],
            &[paid_expense, direct],
            day(20),
        );

        assert_eq!(statement.invoices.len(), 2);
        assert_eq!(statement.invoices[0].balance, dec!(1500));
        assert_eq!(statement.overdue_total(), dec!(1500));
        assert_eq!(statement.direct_payments.len(), 1);
        assert_eq!(statement.ledger.total_invoiced, dec!(2300));
        assert_eq!(statement.ledger.total_paid, dec!(600));
        assert_eq!(statement.ledger.outstanding, dec!(1700));

        let csv = statement.to_csv();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1], "INV-7,2024-04-01,2024-04-10,2000,500,1500,true");
        assert!(rows[3].starts_with("\"Shade guide, rush fee\",2024-04-12"));
        assert_eq!(rows[4], "TOTAL,,,2300,600,1700,");
    }
}
