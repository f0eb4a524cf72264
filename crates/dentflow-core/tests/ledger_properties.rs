//! Property tests for balance computation.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use dentflow_core::ledger::{round_money, ChargeSplit, PatientLedger, MONEY_DECIMALS};
use dentflow_core::models::{Payment, PaymentMethod, TreatmentDefinition, TreatmentRecord};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

/// Amount in cents, 0.01 ..= 10 000.00
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Percentage in hundredths, 0.00 ..= 1.00
fn share() -> impl Strategy<Value = Decimal> {
    (0i64..=100).prop_map(|p| Decimal::new(p, 2))
}

fn method() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::BankTransfer),
        Just(PaymentMethod::Discount),
    ]
}

fn record(patient_id: &str, doctor: Decimal, clinic: Decimal) -> TreatmentRecord {
    TreatmentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        patient_id: patient_id.to_string(),
        dentist_id: "dr".to_string(),
        treatment_definition_id: "def".to_string(),
        treatment_name: "Cleaning".to_string(),
        date: date(),
        affected_teeth: vec![],
        consumed_items: vec![],
        material_cost: Decimal::ZERO,
        doctor_share: doctor,
        clinic_share: clinic,
        total_treatment_cost: doctor + clinic,
        notes: None,
        created_at: String::new(),
    }
}

proptest! {
    #[test]
    fn outstanding_is_charges_minus_paid(
        charges in prop::collection::vec((amount(), amount()), 0..8),
        payments in prop::collection::vec((amount(), method()), 0..8),
    ) {
        let records: Vec<_> = charges.iter().map(|(d, c)| record("p", *d, *c)).collect();
        let payments: Vec<_> = payments
            .iter()
            .map(|(a, m)| Payment::new("p".into(), *a, *m, date()))
            .collect();

        let ledger = PatientLedger::compute(&records, &payments);
        let expected_charges: Decimal = charges.iter().map(|(d, c)| d + c).sum();
        let expected_paid: Decimal = payments.iter().map(|p| p.amount).sum();

        prop_assert_eq!(ledger.total_charges, expected_charges);
        prop_assert_eq!(ledger.total_paid, expected_paid);
        prop_assert_eq!(ledger.total_paid, ledger.total_received + ledger.total_discounts);
        prop_assert_eq!(ledger.outstanding, expected_charges - expected_paid);
    }

    #[test]
    fn ledger_ignores_record_order(
        charges in prop::collection::vec((amount(), amount()), 1..8),
        payments in prop::collection::vec(amount(), 1..8),
    ) {
        let mut records: Vec<_> = charges.iter().map(|(d, c)| record("p", *d, *c)).collect();
        let mut payments: Vec<_> = payments
            .iter()
            .map(|a| Payment::new("p".into(), *a, PaymentMethod::Cash, date()))
            .collect();

        let forward = PatientLedger::compute(&records, &payments);
        records.reverse();
        payments.reverse();
        let backward = PatientLedger::compute(&records, &payments);

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn other_patients_never_leak(
        mine in amount(),
        theirs in amount(),
    ) {
        let records = vec![record("me", mine, Decimal::ZERO), record("them", theirs, Decimal::ZERO)];
        let ledger = PatientLedger::for_patient("me", &records, &[]);
        prop_assert_eq!(ledger.outstanding, mine);
    }

    #[test]
    fn split_total_is_sum_of_shares(
        price in amount(),
        doctor in share(),
        materials in (0i64..=50_000).prop_map(|c| Decimal::new(c, 2)),
    ) {
        let definition = TreatmentDefinition::new(
            "Crown".into(),
            price,
            doctor,
            Decimal::ONE - doctor,
        );
        let split = ChargeSplit::for_price(price, &definition, materials, MONEY_DECIMALS);

        prop_assert_eq!(split.total, split.doctor_share + split.clinic_share);
        prop_assert_eq!(split.doctor_share, round_money(split.doctor_share, MONEY_DECIMALS));
        prop_assert_eq!(split.clinic_share, round_money(split.clinic_share, MONEY_DECIMALS));
        // Materials come out of the clinic's side only.
        prop_assert_eq!(split.doctor_share, round_money(price * doctor, MONEY_DECIMALS));
    }
}
