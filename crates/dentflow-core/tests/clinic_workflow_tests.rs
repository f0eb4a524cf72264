//! End-to-end clinic workflows against the SQLite store.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use dentflow_core::audit::AuditLog;
use dentflow_core::clock::FixedClock;
use dentflow_core::config::ClinicConfig;
use dentflow_core::db::{Database, Repository};
use dentflow_core::discount::{DiscountError, DiscountRequest};
use dentflow_core::ledger::DateRange;
use dentflow_core::models::{
    InventoryItem, Patient, PaymentMethod, StaffMember, StaffRole, SupplierKind, ToothStatus,
};
use dentflow_core::services::{
    Clinic, DefinitionInput, InventoryInput, InvoiceInput, MaterialUse, PatientInput,
    PaymentInput, ServiceError, StaffInput, SupplierInput, TreatmentInput,
};
use dentflow_core::validation::{Confirmation, ValidationError};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn clinic_on(db: Database) -> Clinic<Database> {
    Clinic::new(db, ClinicConfig::default()).with_clock(FixedClock(today()))
}

fn clinic() -> Clinic<Database> {
    clinic_on(Database::open_in_memory().unwrap())
}

fn staff(clinic: &Clinic<Database>, name: &str, role: StaffRole) -> StaffMember {
    clinic
        .staff()
        .add(StaffInput {
            name: name.into(),
            role,
            specialty: None,
            phone: None,
            email: None,
        })
        .unwrap()
}

fn patient(clinic: &Clinic<Database>, name: &str, phone: &str) -> Patient {
    clinic
        .patients()
        .create(PatientInput {
            name: name.into(),
            phone: Some(phone.into()),
            ..PatientInput::default()
        })
        .unwrap()
}

fn cash(patient: &Patient, amount: Decimal) -> PaymentInput {
    PaymentInput {
        patient_id: patient.id.clone(),
        amount,
        method: PaymentMethod::Cash,
        date: today(),
        notes: None,
        acknowledge_duplicate: false,
    }
}

/// Dentist, patient, and a 1000 filling treated with two 50-unit materials.
fn treated_patient(clinic: &Clinic<Database>) -> (Patient, StaffMember, InventoryItem) {
    let dentist = staff(clinic, "Dr. Yara", StaffRole::Dentist);
    let mona = patient(clinic, "Mona Adel", "01012345678");
    let definition = clinic
        .treatments()
        .add_definition(DefinitionInput {
            name: "Composite filling".into(),
            description: None,
            base_price: dec!(1000),
            doctor_percentage: dec!(0.6),
            clinic_percentage: dec!(0.4),
            chart_status: Some(ToothStatus::Filling),
        })
        .unwrap();
    let composite = clinic
        .inventory()
        .add_item(InventoryInput {
            name: "Composite".into(),
            unit: "syringe".into(),
            unit_cost: dec!(50),
            quantity: dec!(10),
            reorder_level: dec!(2),
            supplier_id: None,
        })
        .unwrap();

    clinic
        .treatments()
        .record(TreatmentInput {
            patient_id: mona.id.clone(),
            dentist_id: dentist.id.clone(),
            definition_id: definition.id,
            date: today(),
            affected_teeth: vec!["36".parse().unwrap()],
            materials: vec![MaterialUse {
                item_id: composite.id.clone(),
                quantity: dec!(2),
            }],
            notes: None,
        })
        .unwrap();

    (mona, dentist, composite)
}

#[test]
fn test_treatment_payment_and_chart() {
    let clinic = clinic();
    let (mona, dentist, composite) = treated_patient(&clinic);

    let records = clinic.treatments().for_patient(&mona.id).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].doctor_share, dec!(600));
    assert_eq!(records[0].material_cost, dec!(100));
    assert_eq!(records[0].clinic_share, dec!(300));
    assert_eq!(records[0].charge(), dec!(900));

    let stock: InventoryItem = clinic.store().require(&composite.id).unwrap();
    assert_eq!(stock.quantity, dec!(8));

    clinic.payments().add(cash(&mona, dec!(400))).unwrap();
    let ledger = clinic.patients().ledger(&mona.id).unwrap();
    assert_eq!(ledger.total_charges, dec!(900));
    assert_eq!(ledger.outstanding, dec!(500));

    let chart = clinic.patients().display_chart(&mona.id).unwrap();
    assert_eq!(chart.status_of(&"36".parse().unwrap()), ToothStatus::Filling);
    assert_eq!(chart.status_of(&"11".parse().unwrap()), ToothStatus::Healthy);

    let doctor = clinic.doctor_payments().ledger(&dentist.id).unwrap();
    assert_eq!(doctor.outstanding, dec!(600));

    let stored: Patient = clinic.store().require(&mona.id).unwrap();
    assert_eq!(stored.last_visit, Some(today()));
}

#[test]
fn test_overpayment_and_duplicate_rejected() {
    let clinic = clinic();
    let (mona, _, _) = treated_patient(&clinic);

    assert!(matches!(
        clinic.payments().add(cash(&mona, dec!(901))),
        Err(ServiceError::Validation(ValidationError::AmountExceedsBalance { .. }))
    ));

    clinic.payments().add(cash(&mona, dec!(100))).unwrap();
    assert!(matches!(
        clinic.payments().add(cash(&mona, dec!(100))),
        Err(ServiceError::Validation(ValidationError::PossibleDuplicate { .. }))
    ));

    let acknowledged = PaymentInput {
        acknowledge_duplicate: true,
        ..cash(&mona, dec!(100))
    };
    clinic.payments().add(acknowledged).unwrap();
    assert_eq!(clinic.patients().ledger(&mona.id).unwrap().outstanding, dec!(700));
}

#[test]
fn test_discount_rules() {
    let clinic = clinic();
    let (mona, _, _) = treated_patient(&clinic);
    let owner = staff(&clinic, "Dr. Hany", StaffRole::Owner);
    let desk = staff(&clinic, "Salma", StaffRole::Receptionist);

    let request = |amount: Decimal, approver: &StaffMember| DiscountRequest {
        patient_id: mona.id.clone(),
        amount,
        approver_id: approver.id.clone(),
        reason: Some("loyal patient".into()),
        date: today(),
    };

    assert!(matches!(
        clinic.payments().apply_discount(request(dec!(0), &owner)),
        Err(ServiceError::Discount(DiscountError::NonPositiveAmount(_)))
    ));
    assert!(matches!(
        clinic.payments().apply_discount(request(dec!(1000), &owner)),
        Err(ServiceError::Discount(DiscountError::ExceedsBalance { .. }))
    ));
    assert!(matches!(
        clinic.payments().apply_discount(request(dec!(100), &desk)),
        Err(ServiceError::Discount(DiscountError::NotAuthorized { .. }))
    ));

    clinic.payments().apply_discount(request(dec!(900), &owner)).unwrap();
    assert!(matches!(
        clinic.payments().apply_discount(request(dec!(10), &owner)),
        Err(ServiceError::Discount(DiscountError::NoOutstandingBalance))
    ));

    let ledger = clinic.patients().ledger(&mona.id).unwrap();
    assert_eq!(ledger.total_discounts, dec!(900));
    assert_eq!(ledger.outstanding, dec!(0));

    let log = AuditLog::new(clinic.store());
    assert_eq!(log.for_patient(&mona.id).unwrap().len(), 1);
    log.verify().unwrap();
}

#[test]
fn test_supplier_invoice_paid_in_full() {
    let clinic = clinic();
    let lab = clinic
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
        .unwrap();
    let invoice = clinic
        .suppliers()
        .add_invoice(InvoiceInput {
            supplier_id: lab.id.clone(),
            invoice_number: Some("NDL-2024-31".into()),
            date: today(),
            due_date: NaiveDate::from_ymd_opt(2024, 7, 15),
            amount: dec!(2000),
            items: vec![],
            notes: None,
        })
        .unwrap();

    let first = clinic.suppliers().pay_remaining(&invoice.id, today()).unwrap();
    assert_eq!(first.map(|p| p.amount), Some(dec!(2000)));
    assert_eq!(clinic.suppliers().pay_remaining(&invoice.id, today()).unwrap(), None);

    let ledger = clinic.suppliers().ledger(&lab.id).unwrap();
    assert_eq!(ledger.total_invoiced, dec!(2000));
    assert_eq!(ledger.total_paid, dec!(2000));
    assert_eq!(ledger.outstanding, dec!(0));

    let statement = clinic.reports().supplier_statement(&lab.id).unwrap();
    assert_eq!(statement.invoices[0].balance, dec!(0));
    assert!(!statement.invoices[0].overdue);
}

#[test]
fn test_reprice_and_delete_are_audited() {
    let clinic = clinic();
    let (mona, _, _) = treated_patient(&clinic);
    let owner = staff(&clinic, "Dr. Hany", StaffRole::Owner);
    let record = clinic.treatments().for_patient(&mona.id).unwrap().remove(0);

    let repriced = clinic
        .treatments()
        .reprice(&record.id, dec!(1200), &owner.id, Some("extra surface"))
        .unwrap();
    assert_eq!(repriced.doctor_share, dec!(720));
    assert_eq!(repriced.clinic_share, dec!(380));

    assert!(matches!(
        clinic.treatments().delete(&record.id, &owner.id, Confirmation::Pending),
        Err(ServiceError::Validation(ValidationError::ConfirmationRequired))
    ));
    clinic
        .treatments()
        .delete(&record.id, &owner.id, Confirmation::Confirmed)
        .unwrap();

    let log = AuditLog::new(clinic.store());
    let entries = log.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].prev_hash.as_deref(), Some(entries[0].hash.as_str()));
    log.verify().unwrap();
}

#[test]
fn test_patient_delete_cascades() {
    let clinic = clinic();
    let (mona, dentist, _) = treated_patient(&clinic);
    clinic.payments().add(cash(&mona, dec!(200))).unwrap();

    clinic
        .patients()
        .delete(&mona.id, &dentist.id, Confirmation::Confirmed)
        .unwrap();

    assert!(clinic.patients().get(&mona.id).unwrap().is_none());
    assert!(clinic.treatments().for_patient(&mona.id).unwrap().is_empty());
    assert!(clinic.payments().for_patient(&mona.id).unwrap().is_empty());
    assert_eq!(clinic.doctor_payments().ledger(&dentist.id).unwrap().accrued, dec!(0));
}

#[test]
fn test_invoice_report_from_store() {
    let clinic = clinic();
    let (mona, _, _) = treated_patient(&clinic);
    clinic.payments().add(cash(&mona, dec!(400))).unwrap();

    let invoice = clinic.reports().invoice(&mona.id, DateRange::all()).unwrap();
    assert_eq!(invoice.lines.len(), 1);
    assert_eq!(invoice.lines[0].dentist, "Dr. Yara");
    assert_eq!(invoice.totals.account.outstanding, dec!(500));
    assert!(invoice.to_csv().contains("total,,outstanding,,500"));

    let summary = clinic.reports().clinic_summary(DateRange::all()).unwrap();
    assert_eq!(summary.summary.charges, dec!(900));
    assert_eq!(summary.summary.collected, dec!(400));
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    let mona_id = {
        let clinic = clinic_on(Database::open(&path).unwrap());
        let (mona, _, _) = treated_patient(&clinic);
        clinic.payments().add(cash(&mona, dec!(400))).unwrap();
        mona.id
    };

    let clinic = clinic_on(Database::open(&path).unwrap());
    let found = clinic.patients().search("mona", 10).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, mona_id);

    let by_phone = clinic.patients().search("0101234", 10).unwrap();
    assert_eq!(by_phone.len(), 1);

    assert_eq!(clinic.patients().ledger(&mona_id).unwrap().outstanding, dec!(500));
    let chart = clinic.patients().display_chart(&mona_id).unwrap();
    assert_eq!(chart.status_of(&"36".parse().unwrap()), ToothStatus::Filling);
}
