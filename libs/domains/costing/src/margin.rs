//! Pricing and margin derivation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::Category;
use crate::resolver::ResolvedRecipe;

/// Label used for recipes without a known category
pub const UNCATEGORIZED: &str = "uncategorized";

/// Cost per portion times the utility factor.
///
/// A missing, zero, negative or non-finite factor gives 0 rather than a
/// meaningless price.
pub fn suggested_price(cost_per_portion: f64, utility_factor: Option<f64>) -> f64 {
    match utility_factor {
        Some(factor) if factor.is_finite() && factor > 0.0 => cost_per_portion * factor,
        _ => 0.0,
    }
}

/// Price shown to staff: the owner's selling price when set, else the suggestion.
pub fn display_price(selling_price: Option<f64>, suggested_price: f64) -> f64 {
    selling_price
        .filter(|price| price.is_finite() && *price > 0.0)
        .unwrap_or(suggested_price)
}

/// Gross margin as a percentage of the selling price; 0 without a price.
pub fn margin_percent(selling_price: f64, cost_per_portion: f64) -> f64 {
    if selling_price > 0.0 {
        (selling_price - cost_per_portion) / selling_price * 100.0
    } else {
        0.0
    }
}

/// Arithmetic mean of per-recipe margins, not weighted by cost.
pub fn average_margin(margins: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = margins
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), margin| {
            (sum + margin, count + 1)
        });
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Margin figures of one recipe category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMargin {
    pub category_id: Option<Uuid>,
    pub category_name: String,
    pub recipe_count: usize,
    pub average_margin_percent: f64,
    pub average_cost_per_portion: f64,
}

/// Margin overview across a recipe set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginSummary {
    pub recipe_count: usize,
    pub average_margin_percent: f64,
    pub categories: Vec<CategoryMargin>,
}

/// Group resolved recipes by category. Recipes pointing at an unknown
/// category land in the uncategorized group. Groups are sorted by name.
pub fn summarize(recipes: &[ResolvedRecipe], categories: &[Category]) -> MarginSummary {
    let names: HashMap<Uuid, &str> = categories
        .iter()
        .map(|category| (category.id, category.name.as_str()))
        .collect();

    let mut groups: HashMap<Option<Uuid>, Vec<&ResolvedRecipe>> = HashMap::new();
    for recipe in recipes {
        let key = recipe.category.filter(|id| names.contains_key(id));
        groups.entry(key).or_default().push(recipe);
    }

    let mut grouped: Vec<CategoryMargin> = groups
        .into_iter()
        .map(|(category_id, members)| CategoryMargin {
            category_id,
            category_name: category_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNCATEGORIZED)
                .to_string(),
            recipe_count: members.len(),
            average_margin_percent: average_margin(members.iter().map(|r| r.margin_percent)),
            average_cost_per_portion: members.iter().map(|r| r.cost_per_portion).sum::<f64>()
                / members.len() as f64,
        })
        .collect();
    grouped.sort_by(|a, b| a.category_name.cmp(&b.category_name));

    MarginSummary {
        recipe_count: recipes.len(),
        average_margin_percent: average_margin(recipes.iter().map(|r| r.margin_percent)),
        categories: grouped,
    }
}
