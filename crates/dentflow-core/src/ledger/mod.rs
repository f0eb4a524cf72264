//! Derived financial positions.
//!
//! Nothing here is persisted: balances are recomputed from the raw treatment,
//! payment, invoice and expense records every time they are needed. All
//! functions are pure and order-independent.

mod doctor;
mod patient;
mod split;
mod summary;
mod supplier;

pub use doctor::*;
pub use patient::*;
pub use split::*;
pub use summary::*;
pub use supplier::*;

use rust_decimal::{Decimal, RoundingStrategy};

/// Default number of decimal places for money.
pub const MONEY_DECIMALS: u32 = 2;

/// Round to currency precision, halves away from zero.
pub fn round_money(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}
