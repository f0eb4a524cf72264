//! Treatment definitions and performed treatments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::{log_failure, Clinic, ServiceError, ServiceResult, StaffService};
use crate::audit::{AuditEvent, AuditLog};
use crate::chart::{apply_treatment_status, StatusMapping};
use crate::db::Repository;
use crate::ledger::ChargeSplit;
use crate::models::{
    AuditAction, ConsumedItem, InventoryItem, Patient, ToothId, ToothStatus, TreatmentDefinition,
    TreatmentRecord,
};
use crate::validation::{currency_amount, fraction, optional_text, positive_amount, required_text, Confirmation, ValidationError};

/// Definition form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionInput {
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub doctor_percentage: Decimal,
    pub clinic_percentage: Decimal,
    pub chart_status: Option<ToothStatus>,
}

/// A quantity of one inventory item used during a treatment.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialUse {
    pub item_id: String,
    pub quantity: Decimal,
}

/// Treatment form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentInput {
    pub patient_id: String,
    pub dentist_id: String,
    pub definition_id: String,
    pub date: NaiveDate,
    pub affected_teeth: Vec<ToothId>,
    pub materials: Vec<MaterialUse>,
    pub notes: Option<String>,
}

pub struct TreatmentService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> TreatmentService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    pub fn add_definition(&self, input: DefinitionInput) -> ServiceResult<TreatmentDefinition> {
        self.try_add_definition(input)
            .inspect_err(|e| log_failure("treatments.add_definition", e))
    }

    fn try_add_definition(&self, input: DefinitionInput) -> ServiceResult<TreatmentDefinition> {
        let mut definition = TreatmentDefinition::new(
            String::new(),
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
        );
        apply_definition(&mut definition, input)?;

        self.clinic.store().add(&definition)?;
        info!(definition_id = %definition.id, name = %definition.name, "treatment definition added");
        Ok(definition)
    }

    pub fn update_definition(&self, id: &str, input: DefinitionInput) -> ServiceResult<TreatmentDefinition> {
        self.try_update_definition(id, input)
            .inspect_err(|e| log_failure("treatments.update_definition", e))
    }

    fn try_update_definition(&self, id: &str, input: DefinitionInput) -> ServiceResult<TreatmentDefinition> {
        let mut definition: TreatmentDefinition = self.clinic.store().require(id)?;
        apply_definition(&mut definition, input)?;

        self.clinic.store().update(&definition)?;
        info!(definition_id = %definition.id, "treatment definition updated");
        Ok(definition)
    }

    /// Retire or restore a definition. Existing records keep referencing it.
    pub fn set_definition_active(&self, id: &str, active: bool) -> ServiceResult<TreatmentDefinition> {
        let mut definition: TreatmentDefinition = self.clinic.store().require(id)?;
        definition.active = active;
        self.clinic.store().update(&definition)?;
        info!(definition_id = %definition.id, active, "treatment definition activation changed");
        Ok(definition)
    }

    pub fn definitions(&self, active_only: bool) -> ServiceResult<Vec<TreatmentDefinition>> {
        let mut definitions: Vec<TreatmentDefinition> = self.clinic.store().list()?;
        if active_only {
            definitions.retain(|d| d.active);
        }
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(definitions)
    }

    /// Price a treatment without recording it.
    pub fn preview(&self, definition_id: &str, materials: &[MaterialUse]) -> ServiceResult<ChargeSplit> {
        let store = self.clinic.store();
        let definition: TreatmentDefinition = store.require(definition_id)?;
        let mut consumed = Vec::with_capacity(materials.len());
        for material in materials {
            let item: InventoryItem = store.require(&material.item_id)?;
            consumed.push(ConsumedItem::from_item(&item, material.quantity));
        }
        Ok(ChargeSplit::compute(&definition, &consumed, self.clinic.decimals()))
    }

    /// Record a performed treatment.
    ///
    /// Stock consumption, the record itself, the chart transition and the
    /// patient's last visit are written as one unit. Insufficient stock for
    /// any item rejects the whole treatment.
    pub fn record(&self, input: TreatmentInput) -> ServiceResult<TreatmentRecord> {
        self.try_record(input)
            .inspect_err(|e| log_failure("treatments.record", e))
    }

    fn try_record(&self, input: TreatmentInput) -> ServiceResult<TreatmentRecord> {
        let date = self.clinic.check_date(input.date)?;
        for material in &input.materials {
            positive_amount(material.quantity)?;
        }
        let dentist = StaffService::new(self.clinic).require_dentist(&input.dentist_id)?;
        let decimals = self.clinic.decimals();
        let overrides = &self.clinic.config().chart_status_overrides;

        let record = self.clinic.store().atomically(|store| {
            let mut patient: Patient = store.require(&input.patient_id)?;
            let definition: TreatmentDefinition = store.require(&input.definition_id)?;

            let mut consumed = Vec::with_capacity(input.materials.len());
            for material in &input.materials {
                let mut item: InventoryItem = store.require(&material.item_id)?;
                if item.quantity < material.quantity {
                    return Err(ValidationError::InsufficientStock {
                        item: item.name,
                        available: item.quantity,
                        requested: material.quantity,
                    }
                    .into());
                }
                consumed.push(ConsumedItem::from_item(&item, material.quantity));
                item.quantity -= material.quantity;
                store.update(&item)?;
            }

            let split = ChargeSplit::compute(&definition, &consumed, decimals);
            let record = TreatmentRecord {
                id: uuid::Uuid::new_v4().to_string(),
                patient_id: patient.id.clone(),
                dentist_id: dentist.id.clone(),
                treatment_definition_id: definition.id.clone(),
                treatment_name: definition.name.clone(),
                date,
                affected_teeth: input.affected_teeth.clone(),
                consumed_items: consumed,
                material_cost: split.material_cost,
                doctor_share: split.doctor_share,
                clinic_share: split.clinic_share,
                total_treatment_cost: split.total,
                notes: optional_text(input.notes.clone()),
                created_at: chrono::Utc::now().to_rfc3339(),
            };
            store.add(&record)?;

            if !record.affected_teeth.is_empty() {
                if let Some(status) = StatusMapping::new(overrides).status_for(&definition) {
                    apply_treatment_status(&mut patient.dental_chart, &record.affected_teeth, status);
                }
            }
            patient.record_visit(date);
            patient.touch();
            store.update(&patient)?;

            Ok::<_, ServiceError>(record)
        })?;

        info!(
            record_id = %record.id,
            patient_id = %record.patient_id,
            total = %record.total_treatment_cost,
            "treatment recorded"
        );
        Ok(record)
    }

    /// Set a custom total price. Shares are recomputed from the definition's
    /// percentages and the recorded material cost is deducted again, exactly
    /// as on creation.
    pub fn reprice(
        &self,
        record_id: &str,
        price: Decimal,
        actor_id: &str,
        reason: Option<&str>,
    ) -> ServiceResult<TreatmentRecord> {
        self.try_reprice(record_id, price, actor_id, reason)
            .inspect_err(|e| log_failure("treatments.reprice", e))
    }

    fn try_reprice(
        &self,
        record_id: &str,
        price: Decimal,
        actor_id: &str,
        reason: Option<&str>,
    ) -> ServiceResult<TreatmentRecord> {
        let decimals = self.clinic.decimals();
        currency_amount(price, decimals)?;

        let record = self.clinic.store().atomically(|store| {
            let mut record: TreatmentRecord = store.require(record_id)?;
            let definition: TreatmentDefinition = store.require(&record.treatment_definition_id)?;

            let split = ChargeSplit::for_price(price, &definition, record.material_cost, decimals);
            record.doctor_share = split.doctor_share;
            record.clinic_share = split.clinic_share;
            record.total_treatment_cost = split.total;
            store.update(&record)?;

            AuditLog::new(store).append(
                AuditEvent::new(actor_id, AuditAction::TreatmentRepriced, &record.id)
                    .patient(&record.patient_id)
                    .amount(record.total_treatment_cost)
                    .reason(reason),
            )?;
            Ok::<_, ServiceError>(record)
        })?;

        info!(record_id = %record.id, total = %record.total_treatment_cost, "treatment repriced");
        Ok(record)
    }

    /// Delete a treatment record. Consumed stock is not returned.
    pub fn delete(&self, record_id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        self.try_delete(record_id, actor_id, confirmation)
            .inspect_err(|e| log_failure("treatments.delete", e))
    }

    fn try_delete(&self, record_id: &str, actor_id: &str, confirmation: Confirmation) -> ServiceResult<()> {
        confirmation.require()?;
        self.clinic.store().atomically(|store| {
            let record: TreatmentRecord = store.require(record_id)?;
            store.delete::<TreatmentRecord>(record_id)?;
            AuditLog::new(store).append(
                AuditEvent::new(actor_id, AuditAction::TreatmentDeleted, record_id)
                    .patient(&record.patient_id)
                    .amount(record.charge()),
            )?;
            Ok::<_, ServiceError>(())
        })?;
        info!(record_id, "treatment deleted");
        Ok(())
    }

    /// A patient's treatments, most recent first.
    pub fn for_patient(&self, patient_id: &str) -> ServiceResult<Vec<TreatmentRecord>> {
        let mut records: Vec<TreatmentRecord> = self.clinic.store().list_for(patient_id)?;
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}

fn apply_definition(definition: &mut TreatmentDefinition, input: DefinitionInput) -> ServiceResult<()> {
    definition.name = required_text(&input.name, "name")?;
    definition.description = optional_text(input.description);
    definition.base_price = positive_amount(input.base_price)?;
    definition.doctor_percentage = fraction(input.doctor_percentage, "doctor_percentage")?;
    definition.clinic_percentage = fraction(input.clinic_percentage, "clinic_percentage")?;
    definition.chart_status = input.chart_status;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StaffMember, StaffRole};
    use crate::services::testing::{clinic, today};
    use crate::services::{InventoryInput, PatientInput};
    use rust_decimal_macros::dec;

    struct Fixture {
        clinic: Clinic<crate::db::MemoryStore>,
        patient: Patient,
        dentist: StaffMember,
        definition: TreatmentDefinition,
        composite: InventoryItem,
    }

    fn fixture() -> Fixture {
        let clinic = clinic();
        let patient = clinic
            .patients()
            .create(PatientInput {
                name: "Mona".into(),
                ..PatientInput::default()
            })
            .unwrap();
        let dentist = StaffMember::new("Dr. Yara".into(), StaffRole::Dentist);
        clinic.store().add(&dentist).unwrap();
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
                unit: "capsule".into(),
                unit_cost: dec!(50),
                quantity: dec!(5),
                reorder_level: dec!(1),
                supplier_id: None,
            })
            .unwrap();
        Fixture {
            clinic,
            patient,
            dentist,
            definition,
            composite,
        }
    }

    fn treatment(f: &Fixture, quantity: Decimal) -> TreatmentInput {
        TreatmentInput {
            patient_id: f.patient.id.clone(),
            dentist_id: f.dentist.id.clone(),
            definition_id: f.definition.id.clone(),
            date: today(),
            affected_teeth: vec!["36".parse().unwrap()],
            materials: vec![MaterialUse {
                item_id: f.composite.id.clone(),
                quantity,
            }],
            notes: None,
        }
    }

    #[test]
    fn test_record_splits_and_updates_everything() {
        let f = fixture();
        let record = f.clinic.treatments().record(treatment(&f, dec!(2))).unwrap();

        assert_eq!(record.doctor_share, dec!(600));
        assert_eq!(record.material_cost, dec!(100));
        assert_eq!(record.clinic_share, dec!(300));
        assert_eq!(record.total_treatment_cost, dec!(900));
        assert!(record.is_consistent());

        let item: InventoryItem = f.clinic.store().require(&f.composite.id).unwrap();
        assert_eq!(item.quantity, dec!(3));

        let patient: Patient = f.clinic.store().require(&f.patient.id).unwrap();
        assert_eq!(patient.last_visit, Some(today()));
        assert_eq!(
            patient.dental_chart.status_of(&"36".parse().unwrap()),
            ToothStatus::Filling
        );
    }

    #[test]
    fn test_insufficient_stock_rolls_back() {
        let f = fixture();
        let result = f.clinic.treatments().record(treatment(&f, dec!(6)));
        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::InsufficientStock { .. }))
        ));

        let item: InventoryItem = f.clinic.store().require(&f.composite.id).unwrap();
        assert_eq!(item.quantity, dec!(5));
        assert!(f.clinic.treatments().for_patient(&f.patient.id).unwrap().is_empty());
    }

    #[test]
    fn test_same_item_twice_counts_cumulative_stock() {
        let f = fixture();
        let mut input = treatment(&f, dec!(3));
        input.materials.push(MaterialUse {
            item_id: f.composite.id.clone(),
            quantity: dec!(3),
        });
        assert!(f.clinic.treatments().record(input).is_err());

        let item: InventoryItem = f.clinic.store().require(&f.composite.id).unwrap();
        assert_eq!(item.quantity, dec!(5));
    }

    #[test]
    fn test_unmapped_definition_leaves_chart() {
        let f = fixture();
        let mut def = f.definition.clone();
        def.chart_status = None;
        f.clinic.store().update(&def).unwrap();

        f.clinic.treatments().record(treatment(&f, dec!(1))).unwrap();
        let patient: Patient = f.clinic.store().require(&f.patient.id).unwrap();
        assert_eq!(
            patient.dental_chart.status_of(&"36".parse().unwrap()),
            ToothStatus::Healthy
        );
    }

    #[test]
    fn test_non_dentist_rejected() {
        let f = fixture();
        let desk = StaffMember::new("Salma".into(), StaffRole::Receptionist);
        f.clinic.store().add(&desk).unwrap();
        let mut input = treatment(&f, dec!(1));
        input.dentist_id = desk.id.clone();

        assert!(matches!(
            f.clinic.treatments().record(input),
            Err(ServiceError::Validation(ValidationError::NotADentist(_)))
        ));
    }

    #[test]
    fn test_reprice_keeps_material_deduction_and_audits() {
        let f = fixture();
        let record = f.clinic.treatments().record(treatment(&f, dec!(2))).unwrap();

        let repriced = f
            .clinic
            .treatments()
            .reprice(&record.id, dec!(1200), &f.dentist.id, Some("complex case"))
            .unwrap();
        assert_eq!(repriced.doctor_share, dec!(720));
        assert_eq!(repriced.clinic_share, dec!(380));
        assert_eq!(repriced.total_treatment_cost, dec!(1100));

        let audit = AuditLog::new(f.clinic.store()).entries().unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::TreatmentRepriced);
        assert_eq!(audit[0].amount, Some(dec!(1100)));
    }

    #[test]
    fn test_definition_percentages_validated() {
        let f = fixture();
        let result = f.clinic.treatments().add_definition(DefinitionInput {
            name: "Bad".into(),
            description: None,
            base_price: dec!(100),
            doctor_percentage: dec!(60),
            clinic_percentage: dec!(0.4),
            chart_status: None,
        });
        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::PercentageOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let f = fixture();
        let record = f.clinic.treatments().record(treatment(&f, dec!(1))).unwrap();
        assert!(f
            .clinic
            .treatments()
            .delete(&record.id, &f.dentist.id, Confirmation::Pending)
            .is_err());
        f.clinic
            .treatments()
            .delete(&record.id, &f.dentist.id, Confirmation::Confirmed)
            .unwrap();
        assert!(f.clinic.treatments().for_patient(&f.patient.id).unwrap().is_empty());
    }

    #[test]
    fn test_preview_matches_record() {
        let f = fixture();
        let split = f
            .clinic
            .treatments()
            .preview(
                &f.definition.id,
                &[MaterialUse {
                    item_id: f.composite.id.clone(),
                    quantity: dec!(2),
                }],
            )
            .unwrap();
        assert_eq!(split.total, dec!(900));
    }
}
