//! Suppliers, invoices and expenses.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{error, info};

use super::inventory::restock_item;
use super::{log_failure, Clinic, ServiceError, ServiceResult};
use crate::audit::{AuditEvent, AuditLog};
use crate::db::Repository;
use crate::ledger::{invoice_balance, remaining_payment, SupplierLedger};
use crate::models::{
    AuditAction, Expense, InventoryItem, InvoiceLineItem, InvoicePayment, Supplier, SupplierInvoice,
    SupplierKind,
};
use crate::storage::invoice_scan_path;
use crate::validation::{currency_amount, optional_text, positive_amount, required_text, Confirmation, ValidationError};

/// Supplier form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplierInput {
    pub name: String,
    pub kind: SupplierKind,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Invoice form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceInput {
    pub supplier_id: String,
    pub invoice_number: Option<String>,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub items: Vec<InvoiceLineItem>,
    pub notes: Option<String>,
}

/// Expense form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseInput {
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub supplier_id: Option<String>,
}

pub struct SupplierService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> SupplierService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    pub fn add(&self, input: SupplierInput) -> ServiceResult<Supplier> {
        self.try_add(input).inspect_err(|e| log_failure("suppliers.add", e))
    }

    fn try_add(&self, input: SupplierInput) -> ServiceResult<Supplier> {
        let mut supplier = Supplier::new(String::new(), input.kind);
        apply_supplier(&mut supplier, input)?;
        self.clinic.store().add(&supplier)?;
        info!(supplier_id = %supplier.id, kind = ?supplier.kind, "supplier added");
        Ok(supplier)
    }

    pub fn update(&self, id: &str, input: SupplierInput) -> ServiceResult<Supplier> {
        self.try_update(id, input)
            .inspect_err(|e| log_failure("suppliers.update", e))
    }

    fn try_update(&self, id: &str, input: SupplierInput) -> ServiceResult<Supplier> {
        let mut supplier: Supplier = self.clinic.store().require(id)?;
        apply_supplier(&mut supplier, input)?;
        self.clinic.store().update(&supplier)?;
        info!(supplier_id = %supplier.id, "supplier updated");
        Ok(supplier)
    }

    /// Delete a supplier together with its invoices. Expenses stay in the
    /// books.
    pub fn delete(&self, id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        self.try_delete(id, actor_id, confirmation)
            .inspect_err(|e| log_failure("suppliers.delete", e))
    }

    fn try_delete(&self, id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        confirmation.require()?;
        self.clinic.store().atomically(|store| {
            store.require::<Supplier>(id)?;
            let invoices: Vec<SupplierInvoice> = store.list_for(id)?;
            for invoice in &invoices {
                store.delete::<SupplierInvoice>(&invoice.id)?;
            }
            store.delete::<Supplier>(id)?;
            AuditLog::new(store).append(AuditEvent::new(actor_id, AuditAction::SupplierDeleted, id))?;
            Ok::<_, ServiceError>(())
        })?;
        info!(supplier_id = id, "supplier deleted");
        Ok(())
    }

    pub fn list(&self) -> ServiceResult<Vec<Supplier>> {
        let mut suppliers: Vec<Supplier> = self.clinic.store().list()?;
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    pub fn labs(&self) -> ServiceResult<Vec<Supplier>> {
        Ok(self.list()?.into_iter().filter(Supplier::is_lab).collect())
    }

    /// Record a supplier invoice. Line items, when given, must add up to the
    /// invoice amount; items linked to inventory restock it.
    pub fn add_invoice(&self, input: InvoiceInput) -> ServiceResult<SupplierInvoice> {
        self.try_add_invoice(input)
            .inspect_err(|e| log_failure("suppliers.add_invoice", e))
    }

    fn try_add_invoice(&self, input: InvoiceInput) -> ServiceResult<SupplierInvoice> {
        let amount = currency_amount(input.amount, self.clinic.decimals())?;
        let date = self.clinic.check_date(input.date)?;
        if let Some(due) = input.due_date {
            if due < date {
                return Err(ValidationError::DueBeforeIssue { issued: date, due }.into());
            }
        }

        let mut invoice = SupplierInvoice::new(input.supplier_id.clone(), amount, date);
        invoice.invoice_number = optional_text(input.invoice_number);
        invoice.due_date = input.due_date;
        invoice.notes = optional_text(input.notes);
        invoice.items = input.items;
        for item in &invoice.items {
            required_text(&item.description, "description")?;
            positive_amount(item.quantity)?;
        }
        if !invoice.items.is_empty() && invoice.items_total() != amount {
            return Err(ValidationError::InvoiceTotalMismatch {
                amount,
                items_total: invoice.items_total(),
            }
            .into());
        }

        self.clinic.store().atomically(|store| {
            store.require::<Supplier>(&invoice.supplier_id)?;
            for line in &invoice.items {
                if let Some(item_id) = &line.inventory_item_id {
                    let mut item: InventoryItem = store.require(item_id)?;
                    restock_item(&mut item, line.quantity, Some(line.unit_price))?;
                    store.update(&item)?;
                }
            }
            store.add(&invoice)?;
            Ok::<_, ServiceError>(())
        })?;

        info!(invoice_id = %invoice.id, supplier_id = %invoice.supplier_id, amount = %invoice.amount, "invoice recorded");
        Ok(invoice)
    }

    pub fn invoices(&self, supplier_id: &str) -> ServiceResult<Vec<SupplierInvoice>> {
        let mut invoices: Vec<SupplierInvoice> = self.clinic.store().list_for(supplier_id)?;
        invoices.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(invoices)
    }

    /// Pay part (or all) of an invoice. The payment is booked as an expense
    /// tagged with the supplier and linked from the invoice.
    pub fn pay_invoice(&self, invoice_id: &str, amount: Decimal, date: NaiveDate) -> ServiceResult<InvoicePayment> {
        self.try_pay_invoice(invoice_id, amount, date)
            .inspect_err(|e| log_failure("suppliers.pay_invoice", e))
    }

    fn try_pay_invoice(&self, invoice_id: &str, amount: Decimal, date: NaiveDate) -> ServiceResult<InvoicePayment> {
        let amount = currency_amount(amount, self.clinic.decimals())?;
        let date = self.clinic.check_date(date)?;

        let payment = self.clinic.store().atomically(|store| {
            let mut invoice: SupplierInvoice = store.require(invoice_id)?;
            let supplier: Supplier = store.require(&invoice.supplier_id)?;

            let outstanding = invoice_balance(&invoice);
            if outstanding <= Decimal::ZERO {
                return Err(ValidationError::NothingToPay.into());
            }
            if amount > outstanding {
                return Err(ValidationError::AmountExceedsBalance { amount, outstanding }.into());
            }

            let mut expense = Expense::new(expense_category(&supplier).into(), amount, date);
            expense.description = Some(match &invoice.invoice_number {
                Some(number) => format!("{} invoice {}", supplier.name, number),
                None => format!("{} invoice", supplier.name),
            });
            expense.supplier_id = Some(supplier.id.clone());
            expense.invoice_id = Some(invoice.id.clone());
            store.add(&expense)?;

            let payment = InvoicePayment {
                id: uuid::Uuid::new_v4().to_string(),
                amount,
                date,
                expense_id: Some(expense.id.clone()),
            };
            invoice.payments.push(payment.clone());
            store.update(&invoice)?;
            Ok::<_, ServiceError>(payment)
        })?;

        info!(invoice_id, payment_id = %payment.id, amount = %payment.amount, "invoice payment recorded");
        Ok(payment)
    }

    /// Settle whatever remains on an invoice. A fully paid invoice is left
    /// untouched and `None` is returned.
    pub fn pay_remaining(&self, invoice_id: &str, date: NaiveDate) -> ServiceResult<Option<InvoicePayment>> {
        let invoice: SupplierInvoice = self.clinic.store().require(invoice_id)?;
        match remaining_payment(&invoice) {
            Some(amount) => self.pay_invoice(invoice_id, amount, date).map(Some),
            None => {
                info!(invoice_id, "invoice already settled");
                Ok(None)
            }
        }
    }

    /// Record a clinic expense, optionally against a supplier.
    pub fn add_expense(&self, input: ExpenseInput) -> ServiceResult<Expense> {
        self.try_add_expense(input)
            .inspect_err(|e| log_failure("suppliers.add_expense", e))
    }

    fn try_add_expense(&self, input: ExpenseInput) -> ServiceResult<Expense> {
        let category = required_text(&input.category, "category")?;
        let amount = currency_amount(input.amount, self.clinic.decimals())?;
        let date = self.clinic.check_date(input.date)?;
        let supplier_id = optional_text(input.supplier_id);
        if let Some(id) = &supplier_id {
            self.clinic.store().require::<Supplier>(id)?;
        }

        let mut expense = Expense::new(category, amount, date);
        expense.description = optional_text(input.description);
        expense.supplier_id = supplier_id;
        self.clinic.store().add(&expense)?;
        info!(expense_id = %expense.id, amount = %expense.amount, "expense recorded");
        Ok(expense)
    }

    pub fn expenses(&self) -> ServiceResult<Vec<Expense>> {
        let mut expenses: Vec<Expense> = self.clinic.store().list()?;
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    /// Upload a scan of the paper invoice.
    pub fn upload_invoice_scan(
        &self,
        invoice_id: &str,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> ServiceResult<SupplierInvoice> {
        self.try_upload_scan(invoice_id, file_name, bytes, content_type)
            .inspect_err(|e| log_failure("suppliers.upload_invoice_scan", e))
    }

    fn try_upload_scan(
        &self,
        invoice_id: &str,
        file_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> ServiceResult<SupplierInvoice> {
        let name = required_text(file_name, "file_name")?;
        let mut invoice: SupplierInvoice = self.clinic.store().require(invoice_id)?;
        let files = self.clinic.file_store()?;

        let path = invoice_scan_path(&invoice.supplier_id, &invoice.id, &name);
        let url = files.upload(&path, bytes, content_type).map_err(|e| {
            error!(invoice_id, path = %path, "invoice scan upload failed: {e}");
            e
        })?;

        invoice.scan_url = Some(url);
        self.clinic.store().update(&invoice)?;
        info!(invoice_id, "invoice scan uploaded");
        Ok(invoice)
    }

    /// Outstanding position with a supplier.
    pub fn ledger(&self, supplier_id: &str) -> ServiceResult<SupplierLedger> {
        let store = self.clinic.store();
        store.require::<Supplier>(supplier_id)?;
        let invoices: Vec<SupplierInvoice> = store.list_for(supplier_id)?;
        let expenses: Vec<Expense> = store.list()?;
        Ok(SupplierLedger::compute(supplier_id, &invoices, &expenses))
    }
}

fn expense_category(supplier: &Supplier) -> &'static str {
    match supplier.kind {
        SupplierKind::DentalLab => "lab",
        SupplierKind::Materials => "supplies",
        SupplierKind::Services => "services",
        SupplierKind::Other => "other",
    }
}

fn apply_supplier(supplier: &mut Supplier, input: SupplierInput) -> ServiceResult<()> {
    supplier.name = required_text(&input.name, "name")?;
    supplier.kind = input.kind;
    supplier.contact_name = optional_text(input.contact_name);
    supplier.phone = optional_text(input.phone);
    supplier.email = optional_text(input.email);
    supplier.address = optional_text(input.address);
    supplier.notes = optional_text(input.notes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{clinic, today};
    use crate::services::InventoryInput;
    use crate::storage::LocalFileStore;
    use rust_decimal_macros::dec;

    fn lab(clinic: &Clinic<crate::db::MemoryStore>) -> Supplier {
        clinic
            .suppliers()
            .add(SupplierInput {
                name: "Nile Dental Lab".into(),
                kind: SupplierKind::DentalLab,
                contact_name: None,
                phone: None,
                email: None,
                address: None,
                notes: None,
            })
            .unwrap()
    }

    fn invoice(supplier: &Supplier, amount: Decimal) -> InvoiceInput {
        InvoiceInput {
            supplier_id: supplier.id.clone(),
            invoice_number: Some("INV-7".into()),
            date: today(),
            due_date: None,
            amount,
            items: vec![],
            notes: None,
        }
    }

    #[test]
    fn test_pay_remaining_settles_then_noops() {
        let clinic = clinic();
        let supplier = lab(&clinic);
        let inv = clinic.suppliers().add_invoice(invoice(&supplier, dec!(2000))).unwrap();

        let paid = clinic.suppliers().pay_remaining(&inv.id, today()).unwrap();
        assert_eq!(paid.map(|p| p.amount), Some(dec!(2000)));

        let ledger = clinic.suppliers().ledger(&supplier.id).unwrap();
        assert_eq!(ledger.total_invoiced, dec!(2000));
        assert_eq!(ledger.total_paid, dec!(2000));
        assert_eq!(ledger.outstanding, dec!(0));

        assert_eq!(clinic.suppliers().pay_remaining(&inv.id, today()).unwrap(), None);
        assert_eq!(clinic.suppliers().expenses().unwrap().len(), 1);
    }

    #[test]
    fn test_partial_payment_and_overpay() {
        let clinic = clinic();
        let supplier = lab(&clinic);
        let inv = clinic.suppliers().add_invoice(invoice(&supplier, dec!(1000))).unwrap();

        clinic.suppliers().pay_invoice(&inv.id, dec!(400), today()).unwrap();
        assert!(matches!(
            clinic.suppliers().pay_invoice(&inv.id, dec!(700), today()),
            Err(ServiceError::Validation(ValidationError::AmountExceedsBalance { .. }))
        ));
        assert_eq!(clinic.suppliers().ledger(&supplier.id).unwrap().outstanding, dec!(600));
    }

    #[test]
    fn test_line_items_must_match_and_restock() {
        let clinic = clinic();
        let supplier = lab(&clinic);
        let item = clinic
            .inventory()
            .add_item(InventoryInput {
                name: "Alginate".into(),
                unit: "bag".into(),
                unit_cost: dec!(100),
                quantity: dec!(1),
                reorder_level: dec!(2),
                supplier_id: Some(supplier.id.clone()),
            })
            .unwrap();

        let mut input = invoice(&supplier, dec!(500));
        input.items = vec![InvoiceLineItem {
            description: "Alginate".into(),
            quantity: dec!(4),
            unit_price: dec!(110),
            inventory_item_id: Some(item.id.clone()),
        }];
        assert!(matches!(
            clinic.suppliers().add_invoice(input.clone()),
            Err(ServiceError::Validation(ValidationError::InvoiceTotalMismatch { .. }))
        ));

        input.amount = dec!(440);
        clinic.suppliers().add_invoice(input).unwrap();
        let restocked: InventoryItem = clinic.store().require(&item.id).unwrap();
        assert_eq!(restocked.quantity, dec!(5));
        assert_eq!(restocked.unit_cost, dec!(110));
    }

    #[test]
    fn test_direct_expense_counts_toward_supplier() {
        let clinic = clinic();
        let supplier = lab(&clinic);
        clinic.suppliers().add_invoice(invoice(&supplier, dec!(800))).unwrap();
        clinic
            .suppliers()
            .add_expense(ExpenseInput {
                category: "lab".into(),
                description: None,
                amount: dec!(300),
                date: today(),
                supplier_id: Some(supplier.id.clone()),
            })
            .unwrap();
        assert_eq!(clinic.suppliers().ledger(&supplier.id).unwrap().outstanding, dec!(500));
    }

    #[test]
    fn test_invoice_scan_upload() {
        let dir = tempfile::tempdir().unwrap();
        let clinic = clinic().with_file_store(LocalFileStore::new(dir.path()));
        let supplier = lab(&clinic);
        let inv = clinic.suppliers().add_invoice(invoice(&supplier, dec!(100))).unwrap();

        let updated = clinic
            .suppliers()
            .upload_invoice_scan(&inv.id, "scan.pdf", b"%PDF", "application/pdf")
            .unwrap();
        assert!(updated.scan_url.unwrap().ends_with("_scan.pdf"));
    }

    #[test]
    fn test_delete_cascades_invoices() {
        let clinic = clinic();
        let supplier = lab(&clinic);
        clinic.suppliers().add_invoice(invoice(&supplier, dec!(100))).unwrap();

        clinic
            .suppliers()
            .delete(&supplier.id, "owner-1", Confirmation::Confirmed)
            .unwrap();
        assert!(clinic.suppliers().list().unwrap().is_empty());
        assert!(clinic.suppliers().invoices(&supplier.id).unwrap().is_empty());
    }
}
