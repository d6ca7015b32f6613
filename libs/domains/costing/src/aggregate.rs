//! Component cost aggregation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CompositionEntry, ItemKind, Unit};
use crate::normalize::{CostIndex, entry_kind, index_for};
use crate::units::{finite_or, resolve_line_item_cost};

/// How a composition line was priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Resolved,
    /// Referenced item is missing from the catalog
    Dangling,
    /// Referenced sub-recipe closes a cycle
    Cyclic,
}

/// One priced composition entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub kind: ItemKind,
    /// `None` when the entry's reference could not be read
    pub item_id: Option<Uuid>,
    pub name: Option<String>,
    pub quantity: f64,
    pub usage_unit: Unit,
    pub real_price: f64,
    pub unit_cost: f64,
    pub total_cost: f64,
    pub status: LineStatus,
}

/// Total cost of a composition plus its line breakdown in stored order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Aggregation {
    pub total_cost: f64,
    pub lines: Vec<CostLine>,
}

impl Aggregation {
    pub fn lines_with(&self, status: LineStatus) -> impl Iterator<Item = &CostLine> {
        self.lines.iter().filter(move |line| line.status == status)
    }
}

/// Sum the cost of every entry.
///
/// Ingredients are looked up in `ingredients`, sub-recipes in `sub_recipes`
/// (already resolved, priced at unit cost). Entries without a kind are looked
/// up in `ingredients` first. Missing items contribute zero.
pub fn aggregate_cost(
    entries: &[CompositionEntry],
    ingredients: &CostIndex,
    sub_recipes: &CostIndex,
) -> Aggregation {
    aggregate_entries(entries, ingredients, sub_recipes, &[])
}

/// Same as [`aggregate_cost`], pricing the entries at `cyclic` positions at zero.
pub(crate) fn aggregate_entries(
    entries: &[CompositionEntry],
    ingredients: &CostIndex,
    sub_recipes: &CostIndex,
    cyclic: &[usize],
) -> Aggregation {
    let mut aggregation = Aggregation {
        total_cost: 0.0,
        lines: Vec::with_capacity(entries.len()),
    };

    for (position, entry) in entries.iter().enumerate() {
        let kind = entry_kind(entry, ingredients, |id| sub_recipes.contains_key(id));
        let line = if cyclic.contains(&position) {
            zero_line(entry, kind, LineStatus::Cyclic)
        } else {
            price_entry(entry, kind, index_for(kind, ingredients, sub_recipes))
        };
        aggregation.total_cost += line.total_cost;
        aggregation.lines.push(line);
    }

    aggregation
}

fn price_entry(entry: &CompositionEntry, kind: ItemKind, index: &CostIndex) -> CostLine {
    let Some(source) = entry.item_id().and_then(|id| index.get(&id)) else {
        return zero_line(entry, kind, LineStatus::Dangling);
    };

    let usage_unit = entry.unit.clone().unwrap_or_else(|| source.unit.clone());
    let cost = resolve_line_item_cost(
        source.price,
        Some(source.yield_percent.value()),
        &source.unit,
        &usage_unit,
        entry.quantity,
    );

    CostLine {
        kind,
        item_id: entry.item_id(),
        name: Some(source.name.clone()),
        quantity: finite_or(entry.quantity, 0.0),
        usage_unit,
        real_price: cost.real_price,
        unit_cost: cost.unit_cost,
        total_cost: cost.total_cost,
        status: LineStatus::Resolved,
    }
}

fn zero_line(entry: &CompositionEntry, kind: ItemKind, status: LineStatus) -> CostLine {
    CostLine {
        kind,
        item_id: entry.item_id(),
        name: entry.item.name().map(str::to_string),
        quantity: finite_or(entry.quantity, 0.0),
        usage_unit: entry.unit.clone().unwrap_or_default(),
        real_price: 0.0,
        unit_cost: 0.0,
        total_cost: 0.0,
        status,
    }
}
