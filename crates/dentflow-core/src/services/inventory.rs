//! Clinic stock.

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{log_failure, Clinic, ServiceResult};
use crate::db::Repository;
use crate::models::InventoryItem;
use crate::validation::{non_negative_amount, optional_text, positive_amount, required_text, ValidationError};

/// Inventory form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryInput {
    pub name: String,
    pub unit: String,
    pub unit_cost: Decimal,
    pub quantity: Decimal,
    pub reorder_level: Decimal,
    pub supplier_id: Option<String>,
}

pub struct InventoryService<'a, S: Repository> {
    clinic: &'a Clinic<S>,
}

impl<'a, S: Repository> InventoryService<'a, S> {
    pub fn new(clinic: &'a Clinic<S>) -> Self {
        Self { clinic }
    }

    pub fn add_item(&self, input: InventoryInput) -> ServiceResult<InventoryItem> {
        self.try_add_item(input)
            .inspect_err(|e| log_failure("inventory.add_item", e))
    }

    fn try_add_item(&self, input: InventoryInput) -> ServiceResult<InventoryItem> {
        let mut item = InventoryItem::new(String::new(), String::new(), Decimal::ZERO, Decimal::ZERO);
        apply_input(&mut item, input)?;
        self.clinic.store().add(&item)?;
        info!(item_id = %item.id, name = %item.name, "inventory item added");
        Ok(item)
    }

    pub fn update_item(&self, id: &str, input: InventoryInput) -> ServiceResult<InventoryItem> {
        self.try_update_item(id, input)
            .inspect_err(|e| log_failure("inventory.update_item", e))
    }

    fn try_update_item(&self, id: &str, input: InventoryInput) -> ServiceResult<InventoryItem> {
        let mut item: InventoryItem = self.clinic.store().require(id)?;
        apply_input(&mut item, input)?;
        self.clinic.store().update(&item)?;
        info!(item_id = %item.id, "inventory item updated");
        Ok(item)
    }

    /// Add stock, optionally updating the unit cost to the latest purchase price.
    pub fn restock(&self, id: &str, quantity: Decimal, unit_cost: Option<Decimal>) -> ServiceResult<InventoryItem> {
        self.try_restock(id, quantity, unit_cost)
            .inspect_err(|e| log_failure("inventory.restock", e))
    }

    fn try_restock(&self, id: &str, quantity: Decimal, unit_cost: Option<Decimal>) -> ServiceResult<InventoryItem> {
        positive_amount(quantity)?;
        let mut item: InventoryItem = self.clinic.store().require(id)?;
        restock_item(&mut item, quantity, unit_cost)?;
        self.clinic.store().update(&item)?;
        info!(item_id = %item.id, quantity = %item.quantity, "inventory restocked");
        Ok(item)
    }

    pub fn list(&self) -> ServiceResult<Vec<InventoryItem>> {
        let mut items: Vec<InventoryItem> = self.clinic.store().list()?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    /// Items at or below their reorder level.
    pub fn low_stock(&self) -> ServiceResult<Vec<InventoryItem>> {
        let low: Vec<InventoryItem> = self.list()?.into_iter().filter(InventoryItem::needs_reorder).collect();
        if !low.is_empty() {
            warn!(count = low.len(), "inventory items below reorder level");
        }
        Ok(low)
    }
}

pub(crate) fn restock_item(
    item: &mut InventoryItem,
    quantity: Decimal,
    unit_cost: Option<Decimal>,
) -> Result<(), ValidationError> {
    if let Some(cost) = unit_cost {
        item.unit_cost = non_negative_amount(cost)?;
    }
    item.quantity += quantity;
    Ok(())
}

fn apply_input(item: &mut InventoryItem, input: InventoryInput) -> Result<(), ValidationError> {
    item.name = required_text(&input.name, "name")?;
    item.unit = required_text(&input.unit, "unit")?;
    for value in [input.unit_cost, input.quantity, input.reorder_level] {
        non_negative_amount(value)?;
    }
    item.unit_cost = input.unit_cost;
    item.quantity = input.quantity;
    item.reorder_level = input.reorder_level;
    item.supplier_id = optional_text(input.supplier_id);
    Ok(())
}
