//! Costing Domain
//!
//! Computes what recipes cost to make and what they should sell for, from a
//! catalog of priced ingredients and reusable sub-recipes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← Catalog writes, validation, cost queries
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Catalog access (trait + in-memory implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Resolver   │  ← Sub-recipes in dependency order, then recipes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Aggregate  │  ← Sum of composition lines
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │    Units    │  ← Yield loss and kg/gr, lt/ml conversion
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_costing::{CatalogSnapshot, CostingService, InMemoryCatalogRepository};
//!
//! # async fn run(json: &str) -> Result<(), domain_costing::CostingError> {
//! let snapshot = CatalogSnapshot::from_json(json)?;
//! let service = CostingService::new(InMemoryCatalogRepository::from_snapshot(snapshot));
//!
//! let report = service.cost_report().await?;
//! for recipe in &report.recipes {
//!     println!("{}: {:.2} per portion", recipe.name, recipe.cost_per_portion);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod error;
mod lenient;
pub mod margin;
pub mod models;
pub mod normalize;
pub mod repository;
pub mod resolver;
pub mod service;
pub mod units;

// Re-export commonly used types
pub use aggregate::{Aggregation, CostLine, LineStatus, aggregate_cost};
pub use error::{CostingError, CostingResult};
pub use margin::{CategoryMargin, MarginSummary};
pub use models::{
    CatalogSnapshot, Category, CompositionEntry, CostWarning, CreateCategory, CreateIngredient,
    CreateRecipe, CreateSubRecipe, EntityKind, Ingredient, ItemKind, Recipe, RecipeFigures,
    SubRecipe, Unit, UpdateIngredient, UpdateRecipe, UpdateSubRecipe, YieldPercentage,
    YieldQuantity,
};
pub use repository::{CatalogRepository, InMemoryCatalogRepository};
pub use resolver::{CostReport, ResolvedRecipe, ResolvedSubRecipe, resolve_all_costs};
pub use service::{ComponentCandidate, ComponentCandidates, CostingService};
pub use units::{LineItemCost, resolve_line_item_cost, resolve_unit_cost};
