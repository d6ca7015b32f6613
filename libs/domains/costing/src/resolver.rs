//! Hierarchical cost resolution.
//!
//! Ingredients are leaves. Sub-recipes may reference ingredients and other
//! sub-recipes to any depth; they are resolved in dependency order so every
//! referenced sub-recipe is priced before its users. Recipes are resolved
//! last against both indexes.
//!
//! The traversal works on positions into the input slice with an explicit
//! stack, so a cyclic catalog terminates: the entry that closes a cycle is
//! priced at zero and every sub-recipe on the cycle is flagged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::aggregate::{Aggregation, CostLine, LineStatus, aggregate_cost, aggregate_entries};
use crate::margin;
use crate::models::{
    CostWarning, Ingredient, ItemKind, Recipe, RecipeFigures, SubRecipe, Unit, YieldQuantity,
};
use crate::normalize::{CostIndex, PriceSource, entry_kind, ingredient_index, position_index};

/// Sub-recipe with its costs for this pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSubRecipe {
    pub id: Uuid,
    pub name: String,
    pub unit: Unit,
    pub yield_quantity: YieldQuantity,
    pub total_cost: f64,
    /// Cost per unit of yield
    pub unit_cost: f64,
    /// Part of a composition cycle; some line was priced at zero
    pub cycle_detected: bool,
    pub lines: Vec<CostLine>,
}

/// Recipe with its costs and prices for this pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecipe {
    pub id: Uuid,
    pub name: String,
    pub category: Option<Uuid>,
    pub unit: Unit,
    pub portions: f64,
    pub utility_factor: Option<f64>,
    pub total_cost: f64,
    pub cost_per_portion: f64,
    /// Always computed from current costs
    pub suggested_price: f64,
    /// Owner's selling price when set, else the suggestion
    pub display_price: f64,
    pub margin_percent: f64,
    pub lines: Vec<CostLine>,
}

impl ResolvedRecipe {
    pub fn figures(&self) -> RecipeFigures {
        RecipeFigures {
            total_cost: self.total_cost,
            cost_per_portion: self.cost_per_portion,
            suggested_price: self.suggested_price,
        }
    }
}

/// Result of one resolution pass over a catalog snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostReport {
    /// In input order
    pub sub_recipes: Vec<ResolvedSubRecipe>,
    /// In input order
    pub recipes: Vec<ResolvedRecipe>,
    pub warnings: Vec<CostWarning>,
}

impl CostReport {
    pub fn sub_recipe(&self, id: Uuid) -> Option<&ResolvedSubRecipe> {
        self.sub_recipes.iter().find(|s| s.id == id)
    }

    pub fn recipe(&self, id: Uuid) -> Option<&ResolvedRecipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn warnings_for(&self, id: Uuid) -> impl Iterator<Item = &CostWarning> {
        self.warnings.iter().filter(move |w| w.owner() == id)
    }

    pub fn average_margin(&self) -> f64 {
        margin::average_margin(self.recipes.iter().map(|r| r.margin_percent))
    }
}

/// Resolve every sub-recipe and recipe of a snapshot.
pub fn resolve_all_costs(
    ingredients: &[Ingredient],
    sub_recipes: &[SubRecipe],
    recipes: &[Recipe],
) -> CostReport {
    let mut warnings = Vec::new();

    let ingredient_index = ingredient_index(ingredients);
    let (resolved_sub_recipes, sub_recipe_index) =
        resolve_sub_recipes(sub_recipes, &ingredient_index, &mut warnings);

    let resolved_recipes: Vec<ResolvedRecipe> = recipes
        .iter()
        .map(|recipe| {
            resolve_recipe(
                recipe,
                &ingredient_index,
                &sub_recipe_index,
                &mut warnings,
            )
        })
        .collect();

    debug!(
        ingredients = ingredients.len(),
        sub_recipes = resolved_sub_recipes.len(),
        recipes = resolved_recipes.len(),
        warnings = warnings.len(),
        "Resolved catalog costs"
    );

    CostReport {
        sub_recipes: resolved_sub_recipes,
        recipes: resolved_recipes,
        warnings,
    }
}

/// Phase 1: price sub-recipes in dependency order.
///
/// Returns the resolved sub-recipes in input order and the index recipes
/// are priced against.
pub fn resolve_sub_recipes(
    sub_recipes: &[SubRecipe],
    ingredients: &CostIndex,
    warnings: &mut Vec<CostWarning>,
) -> (Vec<ResolvedSubRecipe>, CostIndex) {
    let positions = position_index(sub_recipes);
    let plan = ResolutionPlan::build(sub_recipes, ingredients, &positions);

    let mut index = CostIndex::with_capacity(sub_recipes.len());
    let mut resolved: Vec<Option<ResolvedSubRecipe>> = vec![None; sub_recipes.len()];

    for &position in &plan.order {
        let sub_recipe = &sub_recipes[position];
        let aggregation = aggregate_entries(
            &sub_recipe.items,
            ingredients,
            &index,
            &plan.cyclic_entries[position],
        );
        collect_line_warnings(sub_recipe.id, &aggregation, warnings);

        let unit_cost = aggregation.total_cost / sub_recipe.yield_quantity.divisor();
        if positions.get(&sub_recipe.id) == Some(&position) {
            index.insert(
                sub_recipe.id,
                PriceSource::from_sub_recipe(sub_recipe, unit_cost),
            );
        }

        resolved[position] = Some(ResolvedSubRecipe {
            id: sub_recipe.id,
            name: sub_recipe.name.clone(),
            unit: sub_recipe.unit.clone(),
            yield_quantity: sub_recipe.yield_quantity,
            total_cost: aggregation.total_cost,
            unit_cost,
            cycle_detected: plan.on_cycle[position],
            lines: aggregation.lines,
        });
    }

    (resolved.into_iter().flatten().collect(), index)
}

/// Phase 2: price one recipe against resolved indexes.
pub fn resolve_recipe(
    recipe: &Recipe,
    ingredients: &CostIndex,
    sub_recipes: &CostIndex,
    warnings: &mut Vec<CostWarning>,
) -> ResolvedRecipe {
    let aggregation = aggregate_cost(&recipe.items, ingredients, sub_recipes);
    collect_line_warnings(recipe.id, &aggregation, warnings);

    let portions = portions(recipe.quantity);
    let cost_per_portion = aggregation.total_cost / portions;

    let suggested_price = margin::suggested_price(cost_per_portion, recipe.utility_factor);
    if !recipe
        .utility_factor
        .is_some_and(|factor| factor.is_finite() && factor > 0.0)
    {
        warn!(recipe_id = %recipe.id, "Recipe has no usable utility factor");
        warnings.push(CostWarning::MissingUtilityFactor { recipe: recipe.id });
    }

    let display_price = margin::display_price(recipe.selling_price, suggested_price);

    ResolvedRecipe {
        id: recipe.id,
        name: recipe.name.clone(),
        category: recipe.category,
        unit: recipe.unit.clone(),
        portions,
        utility_factor: recipe.utility_factor,
        total_cost: aggregation.total_cost,
        cost_per_portion,
        suggested_price,
        display_price,
        margin_percent: margin::margin_percent(display_price, cost_per_portion),
        lines: aggregation.lines,
    }
}

/// Portions a recipe is divided into; a missing or non-positive count is one.
fn portions(quantity: Option<f64>) -> f64 {
    quantity
        .filter(|q| q.is_finite() && *q > 0.0)
        .unwrap_or(1.0)
}

fn collect_line_warnings(owner: Uuid, aggregation: &Aggregation, warnings: &mut Vec<CostWarning>) {
    for line in &aggregation.lines {
        match line.status {
            LineStatus::Resolved => {}
            LineStatus::Dangling => {
                warn!(
                    owner = %owner,
                    item = ?line.item_id,
                    kind = %line.kind,
                    "Dangling composition reference"
                );
                warnings.push(CostWarning::DanglingReference {
                    owner,
                    item: line.item_id,
                    item_kind: line.kind,
                });
            }
            LineStatus::Cyclic => {
                let Some(item) = line.item_id else {
                    continue;
                };
                warn!(owner = %owner, item = %item, "Cyclic sub-recipe reference");
                warnings.push(CostWarning::CycleDetected { owner, item });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unresolved,
    Visiting,
    Resolved,
}

/// Dependency order of sub-recipes plus the entries that close cycles
#[derive(Debug)]
struct ResolutionPlan {
    /// Positions, dependencies first
    order: Vec<usize>,
    /// Per position: entry positions pointing back into the traversal stack
    cyclic_entries: Vec<Vec<usize>>,
    on_cycle: Vec<bool>,
}

impl ResolutionPlan {
    fn build(
        sub_recipes: &[SubRecipe],
        ingredients: &CostIndex,
        positions: &HashMap<Uuid, usize>,
    ) -> Self {
        let count = sub_recipes.len();
        let mut marks = vec![Mark::Unresolved; count];
        let mut plan = ResolutionPlan {
            order: Vec::with_capacity(count),
            cyclic_entries: vec![Vec::new(); count],
            on_cycle: vec![false; count],
        };

        for root in 0..count {
            if marks[root] != Mark::Unresolved {
                continue;
            }

            // (sub-recipe position, next entry to inspect)
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::Visiting;

            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;
                let items = &sub_recipes[node].items;

                if cursor == items.len() {
                    marks[node] = Mark::Resolved;
                    plan.order.push(node);
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let entry = &items[cursor];
                let kind = entry_kind(entry, ingredients, |id| positions.contains_key(id));
                if kind != ItemKind::SubRecipe {
                    continue;
                }
                let Some(&target) = entry.item_id().and_then(|id| positions.get(&id)) else {
                    continue;
                };

                match marks[target] {
                    Mark::Unresolved => {
                        marks[target] = Mark::Visiting;
                        stack.push((target, 0));
                    }
                    Mark::Visiting => {
                        plan.cyclic_entries[node].push(cursor);
                        let start = stack
                            .iter()
                            .position(|(position, _)| *position == target)
                            .unwrap_or(0);
                        for (position, _) in &stack[start..] {
                            plan.on_cycle[*position] = true;
                        }
                    }
                    Mark::Resolved => {}
                }
            }
        }

        plan
    }
}
