//! Index building.
//!
//! Composition entries may carry a bare id or a populated document. Either
//! way the engine only trusts the id and looks the item up in an index built
//! from the current catalog snapshot, so a stale populated copy never leaks
//! old prices into a pass.

use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{CompositionEntry, Ingredient, ItemKind, SubRecipe, Unit, YieldPercentage};

/// Pricing data of anything that can appear in a composition
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSource {
    pub name: String,
    /// Price per `unit`
    pub price: Option<f64>,
    pub yield_percent: YieldPercentage,
    pub unit: Unit,
}

/// Pricing data keyed by identity
pub type CostIndex = HashMap<Uuid, PriceSource>;

impl PriceSource {
    pub fn from_ingredient(ingredient: &Ingredient) -> Self {
        Self {
            name: ingredient.name.clone(),
            price: ingredient.cost,
            yield_percent: ingredient.yield_percent,
            unit: ingredient.unit.clone(),
        }
    }

    /// A resolved sub-recipe priced at its unit cost.
    ///
    /// Its own composition already absorbed every loss, so it is always
    /// applied at full yield.
    pub fn from_sub_recipe(sub_recipe: &SubRecipe, unit_cost: f64) -> Self {
        Self {
            name: sub_recipe.name.clone(),
            price: Some(unit_cost),
            yield_percent: YieldPercentage::FULL,
            unit: sub_recipe.unit.clone(),
        }
    }
}

/// Index ingredients by id. The first record wins on duplicate ids.
pub fn ingredient_index(ingredients: &[Ingredient]) -> CostIndex {
    let mut index = CostIndex::with_capacity(ingredients.len());
    for ingredient in ingredients {
        index
            .entry(ingredient.id)
            .or_insert_with(|| PriceSource::from_ingredient(ingredient));
    }
    index
}

/// Position of every sub-recipe in the slice. The first record wins on
/// duplicate ids.
pub fn position_index(sub_recipes: &[SubRecipe]) -> HashMap<Uuid, usize> {
    let mut index = HashMap::with_capacity(sub_recipes.len());
    for (position, sub_recipe) in sub_recipes.iter().enumerate() {
        index.entry(sub_recipe.id).or_insert(position);
    }
    index
}

/// Pick the index matching an entry kind
pub fn index_for<'a>(
    kind: ItemKind,
    ingredients: &'a CostIndex,
    sub_recipes: &'a CostIndex,
) -> &'a CostIndex {
    match kind {
        ItemKind::Ingredient => ingredients,
        ItemKind::SubRecipe => sub_recipes,
    }
}

/// Kind of the item an entry points at.
///
/// Entries without a stored kind are matched against the ingredients first,
/// then against `is_sub_recipe`. An id found in neither is treated as a
/// missing ingredient.
pub fn entry_kind(
    entry: &CompositionEntry,
    ingredients: &CostIndex,
    is_sub_recipe: impl Fn(&Uuid) -> bool,
) -> ItemKind {
    if let Some(kind) = entry.kind {
        return kind;
    }
    match entry.item_id() {
        Some(id) if ingredients.contains_key(&id) => ItemKind::Ingredient,
        Some(id) if is_sub_recipe(&id) => ItemKind::SubRecipe,
        _ => ItemKind::Ingredient,
    }
}
