//! Treatment and inventory models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::chart::{ToothId, ToothStatus};

/// A priced service template.
///
/// The two percentages are fractions of `base_price` and need not sum to one:
/// material costs come out of the clinic side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentDefinition {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    /// Fraction of the price accrued to the dentist (0.6 = 60%)
    pub doctor_percentage: Decimal,
    /// Fraction of the price retained by the clinic before materials
    pub clinic_percentage: Decimal,
    /// Chart status applied to affected teeth when this treatment is recorded
    #[serde(default)]
    pub chart_status: Option<ToothStatus>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl TreatmentDefinition {
    /// Create a new definition with required fields.
    pub fn new(
        name: String,
        base_price: Decimal,
        doctor_percentage: Decimal,
        clinic_percentage: Decimal,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description: None,
            base_price,
            doctor_percentage,
            clinic_percentage,
            chart_status: None,
            active: true,
        }
    }
}

/// A consumable tracked in clinic stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    /// Unit of measure (e.g., "capsule", "ml", "piece")
    pub unit: String,
    pub unit_cost: Decimal,
    /// Quantity currently in stock
    pub quantity: Decimal,
    /// Stock level at or below which the item needs reordering
    #[serde(default)]
    pub reorder_level: Decimal,
    pub supplier_id: Option<String>,
}

impl InventoryItem {
    pub fn new(name: String, unit: String, unit_cost: Decimal, quantity: Decimal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            unit,
            unit_cost,
            quantity,
            reorder_level: Decimal::ZERO,
            supplier_id: None,
        }
    }

    /// Check if stock has fallen to the reorder level.
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// An inventory item consumed by a treatment, priced at the time of use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumedItem {
    pub item_id: String,
    pub name: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    /// unit_cost × quantity
    pub cost: Decimal,
}

impl ConsumedItem {
    /// Price a quantity of an inventory item at its current unit cost.
    pub fn from_item(item: &InventoryItem, quantity: Decimal) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            quantity,
            unit_cost: item.unit_cost,
            cost: item.unit_cost * quantity,
        }
    }
}

/// One performed treatment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentRecord {
    pub id: String,
    pub patient_id: String,
    pub dentist_id: String,
    pub treatment_definition_id: String,
    /// Definition name at time of treatment (for display/export)
    pub treatment_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub affected_teeth: Vec<ToothId>,
    #[serde(default)]
    pub consumed_items: Vec<ConsumedItem>,
    pub material_cost: Decimal,
    pub doctor_share: Decimal,
    pub clinic_share: Decimal,
    pub total_treatment_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: String,
}

impl TreatmentRecord {
    /// Amount charged to the patient for this record.
    ///
    /// Ledgers use the shares rather than `total_treatment_cost` so that a
    /// record whose shares were edited independently still balances.
    pub fn charge(&self) -> Decimal {
        self.doctor_share + self.clinic_share
    }

    /// Check `total_treatment_cost == doctor_share + clinic_share`.
    pub fn is_consistent(&self) -> bool {
        self.total_treatment_cost == self.charge()
    }
}
