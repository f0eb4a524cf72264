//! Treatment cost and revenue split.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::round_money;
use crate::models::{ConsumedItem, TreatmentDefinition};

/// How a treatment charge divides between dentist and clinic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeSplit {
    /// Sum of consumed item costs
    pub material_cost: Decimal,
    /// price × doctor percentage
    pub doctor_share: Decimal,
    /// price × clinic percentage − material cost. Not floored: it goes
    /// negative when materials exceed the clinic's nominal share.
    pub clinic_share: Decimal,
    /// doctor_share + clinic_share
    pub total: Decimal,
}

impl ChargeSplit {
    /// Split a definition's base price, deducting consumed materials from the
    /// clinic side.
    pub fn compute(
        definition: &TreatmentDefinition,
        consumed: &[ConsumedItem],
        decimals: u32,
    ) -> Self {
        Self::for_price(definition.base_price, definition, material_cost(consumed), decimals)
    }

    /// Split an arbitrary price with the definition's percentages.
    ///
    /// Both the creation path and repricing go through here, so a repriced
    /// record still carries its material deduction.
    pub fn for_price(
        price: Decimal,
        definition: &TreatmentDefinition,
        material_cost: Decimal,
        decimals: u32,
    ) -> Self {
        let doctor_share = round_money(price * definition.doctor_percentage, decimals);
        let clinic_share =
            round_money(price * definition.clinic_percentage - material_cost, decimals);
        Self {
            material_cost,
            doctor_share,
            clinic_share,
            total: doctor_share + clinic_share,
        }
    }
}

/// Sum of `unit_cost × quantity` over consumed items.
pub fn material_cost(consumed: &[ConsumedItem]) -> Decimal {
    consumed.iter().map(|c| c.unit_cost * c.quantity).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MONEY_DECIMALS;
    use crate::models::InventoryItem;
    use rust_decimal_macros::dec;

    fn definition() -> TreatmentDefinition {
        TreatmentDefinition::new("Composite filling".into(), dec!(1000), dec!(0.6), dec!(0.4))
    }

    #[test]
    fn test_split_with_materials() {
        let item = InventoryItem::new("Composite".into(), "capsule".into(), dec!(50), dec!(20));
        let consumed = vec![ConsumedItem::from_item(&item, dec!(2))];

        let split = ChargeSplit::compute(&definition(), &consumed, MONEY_DECIMALS);
        assert_eq!(split.doctor_share, dec!(600));
        assert_eq!(split.material_cost, dec!(100));
        assert_eq!(split.clinic_share, dec!(300));
        assert_eq!(split.total, dec!(900));
    }

    #[test]
    fn test_clinic_share_can_go_negative() {
        let item = InventoryItem::new("Implant fixture".into(), "piece".into(), dec!(500), dec!(3));
        let consumed = vec![ConsumedItem::from_item(&item, dec!(1))];

        let split = ChargeSplit::compute(&definition(), &consumed, MONEY_DECIMALS);
        assert_eq!(split.clinic_share, dec!(-100));
        assert_eq!(split.total, dec!(500));
    }

    #[test]
    fn test_rounding_keeps_total_exact() {
        let def = TreatmentDefinition::new("Odd".into(), dec!(333.33), dec!(0.333), dec!(0.667));
        let split = ChargeSplit::compute(&def, &[], MONEY_DECIMALS);
        assert_eq!(split.doctor_share, dec!(111.00));
        assert_eq!(split.clinic_share, dec!(222.33));
        assert_eq!(split.total, split.doctor_share + split.clinic_share);
    }

    #[test]
    fn test_reprice_deducts_materials() {
        let split = ChargeSplit::for_price(dec!(1200), &definition(), dec!(100), MONEY_DECIMALS);
        assert_eq!(split.doctor_share, dec!(720));
        assert_eq!(split.clinic_share, dec!(380));
        assert_eq!(split.total, dec!(1100));
    }
}
