//! Entity trait and its implementations for the domain models.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    Appointment, AuditEntry, DoctorPayment, Expense, InventoryItem, LabCase, Patient, Payment,
    Prescription, StaffMember, Supplier, SupplierInvoice, TreatmentDefinition, TreatmentRecord,
};

/// A record type persisted through a [`crate::db::Repository`].
pub trait Entity: Serialize + DeserializeOwned {
    /// Backing table name
    const TABLE: &'static str;

    /// Primary key.
    fn id(&self) -> &str;

    /// Scoping key for [`crate::db::Repository::list_for`].
    fn owner_id(&self) -> Option<&str> {
        None
    }
}

impl Entity for Patient {
    const TABLE: &'static str = "patients";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for StaffMember {
    const TABLE: &'static str = "staff";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Appointment {
    const TABLE: &'static str = "appointments";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.patient_id)
    }
}

impl Entity for TreatmentDefinition {
    const TABLE: &'static str = "treatment_definitions";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for TreatmentRecord {
    const TABLE: &'static str = "treatment_records";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.patient_id)
    }
}

impl Entity for InventoryItem {
    const TABLE: &'static str = "inventory_items";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        self.supplier_id.as_deref()
    }
}

impl Entity for Payment {
    const TABLE: &'static str = "payments";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.patient_id)
    }
}

impl Entity for DoctorPayment {
    const TABLE: &'static str = "doctor_payments";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.dentist_id)
    }
}

impl Entity for Expense {
    const TABLE: &'static str = "expenses";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        self.supplier_id.as_deref()
    }
}

impl Entity for Supplier {
    const TABLE: &'static str = "suppliers";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for SupplierInvoice {
    const TABLE: &'static str = "supplier_invoices";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.supplier_id)
    }
}

impl Entity for LabCase {
    const TABLE: &'static str = "lab_cases";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.patient_id)
    }
}

impl Entity for Prescription {
    const TABLE: &'static str = "prescriptions";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        Some(&self.patient_id)
    }
}

impl Entity for AuditEntry {
    const TABLE: &'static str = "audit_log";

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ENTITY_TABLES;

    #[test]
    fn test_every_entity_has_a_table() {
        let tables = [
            Patient::TABLE,
            StaffMember::TABLE,
            Appointment::TABLE,
            TreatmentDefinition::TABLE,
            TreatmentRecord::TABLE,
            InventoryItem::TABLE,
            Payment::TABLE,
            DoctorPayment::TABLE,
            Expense::TABLE,
            Supplier::TABLE,
            SupplierInvoice::TABLE,
            LabCase::TABLE,
            Prescription::TABLE,
            AuditEntry::TABLE,
        ];
        for table in tables {
            assert!(ENTITY_TABLES.contains(&table), "{} not in schema", table);
        }
        assert_eq!(tables.len(), ENTITY_TABLES.len());
    }
}
