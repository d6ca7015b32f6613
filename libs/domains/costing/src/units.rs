//! Unit cost resolution.
//!
//! Turns a purchase price into the cost of one usage unit: first the yield
//! loss is priced in, then mass/volume units are converted.

use serde::{Deserialize, Serialize};

use crate::models::Unit;

/// Price per usable unit once yield loss is accounted for.
///
/// A yield of zero or below is passed through untouched rather than divided by.
pub fn apply_yield(base_price: f64, yield_percent: f64) -> f64 {
    if yield_percent > 0.0 {
        base_price / (yield_percent / 100.0)
    } else {
        base_price
    }
}

/// Convert a per-unit price from the purchase unit to the usage unit.
///
/// Only kg↔gr and lt↔ml convert; every other pair is returned unchanged.
pub fn convert(price: f64, price_unit: &Unit, usage_unit: &Unit) -> f64 {
    match (price_unit, usage_unit) {
        (Unit::Kg, Unit::Gr) | (Unit::Lt, Unit::Ml) => price / 1000.0,
        (Unit::Gr, Unit::Kg) | (Unit::Ml, Unit::Lt) => price * 1000.0,
        _ => price,
    }
}

/// Cost of one usage unit, before quantity.
pub fn resolve_unit_cost(
    base_price: f64,
    yield_percent: f64,
    price_unit: &Unit,
    usage_unit: &Unit,
) -> f64 {
    convert(
        apply_yield(base_price, yield_percent),
        price_unit,
        usage_unit,
    )
}

/// Breakdown of a single composition line
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LineItemCost {
    /// Price per purchase unit after yield loss
    pub real_price: f64,
    /// Price per usage unit
    pub unit_cost: f64,
    pub total_cost: f64,
}

/// Cost of `quantity` usage units.
///
/// Absent or non-finite inputs fall back to price 0, yield 100% and
/// quantity 0, so this never fails.
pub fn resolve_line_item_cost(
    base_price: Option<f64>,
    yield_percent: Option<f64>,
    price_unit: &Unit,
    usage_unit: &Unit,
    quantity: Option<f64>,
) -> LineItemCost {
    let base_price = finite_or(base_price, 0.0);
    let yield_percent = finite_or(yield_percent, 100.0);
    let quantity = finite_or(quantity, 0.0);

    let real_price = apply_yield(base_price, yield_percent);
    let unit_cost = convert(real_price, price_unit, usage_unit);

    LineItemCost {
        real_price,
        unit_cost,
        total_cost: unit_cost * quantity,
    }
}

pub(crate) fn finite_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default)
}
