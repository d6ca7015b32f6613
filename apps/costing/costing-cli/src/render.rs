//! Plain-text rendering of costing results.

use domain_costing::{
    ComponentCandidates, CostLine, CostReport, LineStatus, MarginSummary, ResolvedRecipe,
    ResolvedSubRecipe,
};
use std::fmt::Write;

pub fn report(report: &CostReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Sub-recipes ({})", report.sub_recipes.len());
    for sub_recipe in &report.sub_recipes {
        let _ = writeln!(
            out,
            "  {:<32} total {:>10.2}  per {:<4} {:>10.4}{}",
            sub_recipe.name,
            sub_recipe.total_cost,
            sub_recipe.unit,
            sub_recipe.unit_cost,
            if sub_recipe.cycle_detected { "  [cycle]" } else { "" }
        );
    }

    let _ = writeln!(out, "Recipes ({})", report.recipes.len());
    for recipe in &report.recipes {
        let _ = writeln!(
            out,
            "  {:<32} total {:>10.2}  portion {:>8.2}  price {:>8.2}  margin {:>6.1}%",
            recipe.name,
            recipe.total_cost,
            recipe.cost_per_portion,
            recipe.display_price,
            recipe.margin_percent
        );
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "Warnings ({})", report.warnings.len());
        for warning in &report.warnings {
            let _ = writeln!(out, "  {warning}");
        }
    }

    out
}

pub fn sub_recipe(sub_recipe: &ResolvedSubRecipe) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", sub_recipe.name, sub_recipe.id);
    let _ = writeln!(
        out,
        "yield {} {}",
        sub_recipe.yield_quantity.value(),
        sub_recipe.unit
    );
    lines(&mut out, &sub_recipe.lines);
    let _ = writeln!(out, "total cost  {:.2}", sub_recipe.total_cost);
    let _ = writeln!(
        out,
        "unit cost   {:.4} per {}",
        sub_recipe.unit_cost, sub_recipe.unit
    );
    if sub_recipe.cycle_detected {
        let _ = writeln!(out, "part of a composition cycle");
    }
    out
}

pub fn recipe(recipe: &ResolvedRecipe) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", recipe.name, recipe.id);
    let _ = writeln!(out, "portions {}", recipe.portions);
    lines(&mut out, &recipe.lines);
    let _ = writeln!(out, "total cost        {:.2}", recipe.total_cost);
    let _ = writeln!(out, "cost per portion  {:.2}", recipe.cost_per_portion);
    let _ = writeln!(out, "suggested price   {:.2}", recipe.suggested_price);
    let _ = writeln!(out, "selling price     {:.2}", recipe.display_price);
    let _ = writeln!(out, "margin            {:.1}%", recipe.margin_percent);
    out
}

pub fn margins(summary: &MarginSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} recipes, average margin {:.1}%",
        summary.recipe_count, summary.average_margin_percent
    );
    for category in &summary.categories {
        let _ = writeln!(
            out,
            "  {:<24} {:>4} recipes  margin {:>6.1}%  avg portion cost {:>8.2}",
            category.category_name,
            category.recipe_count,
            category.average_margin_percent,
            category.average_cost_per_portion
        );
    }
    out
}

pub fn candidates(candidates: &ComponentCandidates) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Ingredients");
    for candidate in &candidates.ingredients {
        let _ = writeln!(
            out,
            "  {}  {:<32} {:>10.4} per {}",
            candidate.id, candidate.name, candidate.unit_cost, candidate.unit
        );
    }
    let _ = writeln!(out, "Sub-recipes");
    for candidate in &candidates.sub_recipes {
        let _ = writeln!(
            out,
            "  {}  {:<32} {:>10.4} per {}",
            candidate.id, candidate.name, candidate.unit_cost, candidate.unit
        );
    }
    out
}

fn lines(out: &mut String, lines: &[CostLine]) {
    for line in lines {
        let name = line.name.as_deref().unwrap_or("?");
        let flag = match line.status {
            LineStatus::Resolved => "",
            LineStatus::Dangling => "  [missing]",
            LineStatus::Cyclic => "  [cycle]",
        };
        let _ = writeln!(
            out,
            "  {:<12} {:<28} {:>10} {:<4} x {:>10.4} = {:>10.2}{}",
            line.kind, name, line.quantity, line.usage_unit, line.unit_cost, line.total_cost, flag
        );
    }
}
