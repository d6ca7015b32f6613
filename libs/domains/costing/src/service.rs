use observability::CostingMetrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CostingError, CostingResult};
use crate::margin::{self, MarginSummary};
use crate::models::{
    Category, CompositionEntry, CreateCategory, CreateIngredient, CreateRecipe, CreateSubRecipe,
    EntityKind, Ingredient, ItemKind, Recipe, SubRecipe, Unit, UpdateIngredient, UpdateRecipe,
    UpdateSubRecipe,
};
use crate::repository::CatalogRepository;
use crate::resolver::{CostReport, ResolvedRecipe, ResolvedSubRecipe, resolve_all_costs};
use crate::units::{apply_yield, finite_or};

/// Something that can be added to a composition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentCandidate {
    pub id: Uuid,
    pub name: String,
    pub kind: ItemKind,
    pub unit: Unit,
    /// Current cost of one `unit`, after yield
    pub unit_cost: f64,
}

/// Items offered when editing a composition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentCandidates {
    pub ingredients: Vec<ComponentCandidate>,
    pub sub_recipes: Vec<ComponentCandidate>,
}

/// Service layer for catalog maintenance and cost queries
pub struct CostingService<R: CatalogRepository> {
    repository: Arc<R>,
}

impl<R: CatalogRepository> CostingService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    // =========================================================================
    // Cost queries
    // =========================================================================

    /// Resolve the whole catalog in one pass
    #[instrument(skip(self))]
    pub async fn cost_report(&self) -> CostingResult<CostReport> {
        let start = Instant::now();
        let (ingredients, sub_recipes, recipes) = tokio::try_join!(
            self.repository.list_ingredients(),
            self.repository.list_sub_recipes(),
            self.repository.list_recipes(),
        )?;

        let report = resolve_all_costs(&ingredients, &sub_recipes, &recipes);

        CostingMetrics::record_resolution(
            report.sub_recipes.len(),
            report.recipes.len(),
            report.warnings.len(),
            start.elapsed().as_millis() as u64,
        );
        for warning in &report.warnings {
            CostingMetrics::record_warning(warning.kind());
        }
        CostingMetrics::set_average_margin(report.average_margin());

        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn sub_recipe_costing(&self, id: Uuid) -> CostingResult<ResolvedSubRecipe> {
        self.cost_report()
            .await?
            .sub_recipe(id)
            .cloned()
            .ok_or(CostingError::not_found(EntityKind::SubRecipe, id))
    }

    #[instrument(skip(self))]
    pub async fn recipe_costing(&self, id: Uuid) -> CostingResult<ResolvedRecipe> {
        self.cost_report()
            .await?
            .recipe(id)
            .cloned()
            .ok_or(CostingError::not_found(EntityKind::Recipe, id))
    }

    /// Average margins overall and per category
    #[instrument(skip(self))]
    pub async fn margin_summary(&self) -> CostingResult<MarginSummary> {
        let (report, categories) =
            tokio::try_join!(self.cost_report(), self.repository.list_categories())?;
        Ok(margin::summarize(&report.recipes, &categories))
    }

    /// Active ingredients and sub-recipes that may be added to a composition.
    ///
    /// `editing` is the sub-recipe being edited, if any; it is never offered
    /// as a component of itself.
    #[instrument(skip(self))]
    pub async fn component_candidates(
        &self,
        editing: Option<Uuid>,
    ) -> CostingResult<ComponentCandidates> {
        let (ingredients, report) =
            tokio::try_join!(self.repository.list_ingredients(), self.cost_report())?;

        let ingredients = ingredients
            .into_iter()
            .filter(|ingredient| ingredient.is_active && Some(ingredient.id) != editing)
            .map(|ingredient| ComponentCandidate {
                unit_cost: apply_yield(
                    finite_or(ingredient.cost, 0.0),
                    ingredient.yield_percent.value(),
                ),
                id: ingredient.id,
                name: ingredient.name,
                kind: ItemKind::Ingredient,
                unit: ingredient.unit,
            })
            .collect();

        let sub_recipes = report
            .sub_recipes
            .into_iter()
            .filter(|sub_recipe| Some(sub_recipe.id) != editing)
            .map(|sub_recipe| ComponentCandidate {
                id: sub_recipe.id,
                name: sub_recipe.name,
                kind: ItemKind::SubRecipe,
                unit: sub_recipe.unit,
                unit_cost: sub_recipe.unit_cost,
            })
            .collect();

        Ok(ComponentCandidates {
            ingredients,
            sub_recipes,
        })
    }

    /// Recompute cached figures of every recipe and store those that changed
    #[instrument(skip(self))]
    pub async fn refresh_recipe_figures(&self) -> CostingResult<CostReport> {
        let report = self.cost_report().await?;
        let recipes = self.repository.list_recipes().await?;

        let mut refreshed = 0usize;
        for recipe in &recipes {
            let Some(resolved) = report.recipe(recipe.id) else {
                continue;
            };
            let figures = resolved.figures();
            if recipe.cached_figures() != Some(figures) {
                self.repository.save_recipe_figures(recipe.id, figures).await?;
                refreshed += 1;
            }
        }

        tracing::debug!(refreshed = refreshed, "Refreshed recipe figures");
        Ok(report)
    }

    // =========================================================================
    // Ingredients
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_ingredients(&self) -> CostingResult<Vec<Ingredient>> {
        self.repository.list_ingredients().await
    }

    #[instrument(skip(self))]
    pub async fn get_ingredient(&self, id: Uuid) -> CostingResult<Ingredient> {
        self.repository
            .get_ingredient(id)
            .await?
            .ok_or(CostingError::not_found(EntityKind::Ingredient, id))
    }

    #[instrument(skip(self, input), fields(ingredient_name = %input.name))]
    pub async fn create_ingredient(&self, input: CreateIngredient) -> CostingResult<Ingredient> {
        input
            .validate()
            .map_err(|e| CostingError::Validation(e.to_string()))?;

        let ingredient = self.repository.create_ingredient(input).await?;
        CostingMetrics::record_catalog_write("ingredient", "create");
        Ok(ingredient)
    }

    #[instrument(skip(self, input))]
    pub async fn update_ingredient(
        &self,
        id: Uuid,
        input: UpdateIngredient,
    ) -> CostingResult<Ingredient> {
        input
            .validate()
            .map_err(|e| CostingError::Validation(e.to_string()))?;

        let ingredient = self.repository.update_ingredient(id, input).await?;
        CostingMetrics::record_catalog_write("ingredient", "update");
        self.refresh_recipe_figures().await?;
        Ok(ingredient)
    }

    #[instrument(skip(self))]
    pub async fn delete_ingredient(&self, id: Uuid) -> CostingResult<()> {
        if !self.repository.delete_ingredient(id).await? {
            return Err(CostingError::not_found(EntityKind::Ingredient, id));
        }
        CostingMetrics::record_catalog_write("ingredient", "delete");
        self.refresh_recipe_figures().await?;
        Ok(())
    }

    // =========================================================================
    // Sub-recipes
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_sub_recipes(&self) -> CostingResult<Vec<SubRecipe>> {
        self.repository.list_sub_recipes().await
    }

    #[instrument(skip(self))]
    pub async fn get_sub_recipe(&self, id: Uuid) -> CostingResult<SubRecipe> {
        self.repository
            .get_sub_recipe(id)
            .await?
            .ok_or(CostingError::not_found(EntityKind::SubRecipe, id))
    }

    #[instrument(skip(self, input), fields(sub_recipe_name = %input.name))]
    pub async fn create_sub_recipe(&self, input: CreateSubRecipe) -> CostingResult<SubRecipe> {
        input
            .validate()
            .map_err(|e| CostingError::Validation(e.to_string()))?;

        let sub_recipe = self.repository.create_sub_recipe(input).await?;
        CostingMetrics::record_catalog_write("sub_recipe", "create");
        Ok(sub_recipe)
    }

    /// Update a sub-recipe. A new composition replaces the old one entirely.
    #[instrument(skip(self, input))]
    pub async fn update_sub_recipe(
        &self,
        id: Uuid,
        input: UpdateSubRecipe,
    ) -> CostingResult<SubRecipe> {
        input
            .validate()
            .map_err(|e| CostingError::Validation(e.to_string()))?;

        if let Some(items) = &input.items {
            reject_self_reference(id, items)?;
        }

        let sub_recipe = self.repository.update_sub_recipe(id, input).await?;
        CostingMetrics::record_catalog_write("sub_recipe", "update");
        self.refresh_recipe_figures().await?;
        Ok(sub_recipe)
    }

    #[instrument(skip(self))]
    pub async fn delete_sub_recipe(&self, id: Uuid) -> CostingResult<()> {
        if !self.repository.delete_sub_recipe(id).await? {
            return Err(CostingError::not_found(EntityKind::SubRecipe, id));
        }
        CostingMetrics::record_catalog_write("sub_recipe", "delete");
        self.refresh_recipe_figures().await?;
        Ok(())
    }

    // =========================================================================
    // Recipes
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_recipes(&self) -> CostingResult<Vec<Recipe>> {
        self.repository.list_recipes().await
    }

    #[instrument(skip(self))]
    pub async fn get_recipe(&self, id: Uuid) -> CostingResult<Recipe> {
        self.repository
            .get_recipe(id)
            .await?
            .ok_or(CostingError::not_found(EntityKind::Recipe, id))
    }

    /// Create a recipe and store its computed figures
    #[instrument(skip(self, input), fields(recipe_name = %input.name))]
    pub async fn create_recipe(&self, input: CreateRecipe) -> CostingResult<Recipe> {
        input
            .validate()
            .map_err(|e| CostingError::Validation(e.to_string()))?;

        let recipe = self.repository.create_recipe(input).await?;
        CostingMetrics::record_catalog_write("recipe", "create");
        self.refresh_recipe_figures().await?;
        self.get_recipe(recipe.id).await
    }

    /// Update a recipe and store its recomputed figures
    #[instrument(skip(self, input))]
    pub async fn update_recipe(&self, id: Uuid, input: UpdateRecipe) -> CostingResult<Recipe> {
        input
            .validate()
            .map_err(|e| CostingError::Validation(e.to_string()))?;

        self.repository.update_recipe(id, input).await?;
        CostingMetrics::record_catalog_write("recipe", "update");
        self.refresh_recipe_figures().await?;
        self.get_recipe(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete_recipe(&self, id: Uuid) -> CostingResult<()> {
        if !self.repository.delete_recipe(id).await? {
            return Err(CostingError::not_found(EntityKind::Recipe, id));
        }
        CostingMetrics::record_catalog_write("recipe", "delete");
        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> CostingResult<Vec<Category>> {
        self.repository.list_categories().await
    }

    #[instrument(skip(self, input), fields(category_name = %input.name))]
    pub async fn create_category(&self, input: CreateCategory) -> CostingResult<Category> {
        input
            .validate()
            .map_err(|e| CostingError::Validation(e.to_string()))?;

        let category = self.repository.create_category(input).await?;
        CostingMetrics::record_catalog_write("category", "create");
        Ok(category)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> CostingResult<()> {
        if !self.repository.delete_category(id).await? {
            return Err(CostingError::not_found(EntityKind::Category, id));
        }
        CostingMetrics::record_catalog_write("category", "delete");
        Ok(())
    }
}

impl<R: CatalogRepository> Clone for CostingService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn reject_self_reference(id: Uuid, items: &[CompositionEntry]) -> CostingResult<()> {
    let references_itself = items
        .iter()
        .any(|entry| {
            entry.kind != Some(ItemKind::Ingredient) && entry.item_id() == Some(id)
        });
    if references_itself {
        return Err(CostingError::SelfReference {
            kind: EntityKind::SubRecipe,
            id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecipeFigures, YieldPercentage, YieldQuantity};
    use crate::repository::MockCatalogRepository;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn ingredient(cost: f64, unit: Unit) -> Ingredient {
        Ingredient {
            id: Uuid::now_v7(),
            name: "Tomato".to_string(),
            unit,
            cost: Some(cost),
            yield_percent: YieldPercentage::FULL,
            category: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn recipe(items: Vec<CompositionEntry>) -> Recipe {
        Recipe {
            id: Uuid::now_v7(),
            name: "Salad".to_string(),
            category: None,
            quantity: Some(2.0),
            unit: Unit::Pz,
            yield_percent: YieldPercentage::FULL,
            items,
            utility_factor: Some(3.0),
            selling_price: None,
            total_cost: None,
            cost_per_portion: None,
            suggested_price: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn mock_catalog(
        ingredients: Vec<Ingredient>,
        sub_recipes: Vec<SubRecipe>,
        recipes: Vec<Recipe>,
    ) -> MockCatalogRepository {
        let mut mock_repo = MockCatalogRepository::new();
        mock_repo
            .expect_list_ingredients()
            .returning(move || Ok(ingredients.clone()));
        mock_repo
            .expect_list_sub_recipes()
            .returning(move || Ok(sub_recipes.clone()));
        mock_repo
            .expect_list_recipes()
            .returning(move || Ok(recipes.clone()));
        mock_repo
    }

    #[tokio::test]
    async fn test_recipe_costing() {
        let tomato = ingredient(4.0, Unit::Kg);
        let salad = recipe(vec![CompositionEntry::ingredient(
            tomato.id,
            500.0,
            Some(Unit::Gr),
        )]);
        let salad_id = salad.id;

        let service = CostingService::new(mock_catalog(vec![tomato], vec![], vec![salad]));
        let costing = service.recipe_costing(salad_id).await.unwrap();

        assert!((costing.total_cost - 2.0).abs() < 1e-9);
        assert!((costing.cost_per_portion - 1.0).abs() < 1e-9);
        assert!((costing.suggested_price - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_recipe_is_not_found() {
        let service = CostingService::new(mock_catalog(vec![], vec![], vec![]));
        let result = service.recipe_costing(Uuid::now_v7()).await;

        assert!(matches!(
            result,
            Err(CostingError::NotFound {
                kind: EntityKind::Recipe,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_repository_errors_propagate() {
        let mut mock_repo = MockCatalogRepository::new();
        mock_repo
            .expect_list_ingredients()
            .returning(|| Err(CostingError::Database("connection reset".to_string())));
        mock_repo.expect_list_sub_recipes().returning(|| Ok(vec![]));
        mock_repo.expect_list_recipes().returning(|| Ok(vec![]));

        let service = CostingService::new(mock_repo);
        let result = service.cost_report().await;

        assert!(matches!(result, Err(CostingError::Database(_))));
    }

    #[tokio::test]
    async fn test_update_sub_recipe_rejects_self_reference() {
        // No repository expectations: the update must stop before storage.
        let service = CostingService::new(MockCatalogRepository::new());
        let id = Uuid::now_v7();

        let result = service
            .update_sub_recipe(
                id,
                UpdateSubRecipe {
                    items: Some(vec![CompositionEntry::sub_recipe(id, 1.0, None)]),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(CostingError::SelfReference { .. })));
    }

    #[test]
    fn test_self_reference_without_stored_kind() {
        let id = Uuid::now_v7();
        let mut entry = CompositionEntry::sub_recipe(id, 1.0, None);
        entry.kind = None;

        assert!(reject_self_reference(id, &[entry]).is_err());
        assert!(reject_self_reference(id, &[CompositionEntry::ingredient(id, 1.0, None)]).is_ok());
    }

    #[tokio::test]
    async fn test_create_ingredient_validates_input() {
        let service = CostingService::new(MockCatalogRepository::new());

        let result = service
            .create_ingredient(CreateIngredient {
                name: "Saffron".to_string(),
                unit: Unit::Gr,
                cost: -1.0,
                yield_percent: 100.0,
                category: None,
                is_active: true,
            })
            .await;

        assert!(matches!(result, Err(CostingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_recipe_rejects_zero_portions() {
        let service = CostingService::new(MockCatalogRepository::new());

        let result = service
            .create_recipe(CreateRecipe {
                name: "Stew".to_string(),
                category: None,
                quantity: 0.0,
                unit: Unit::Pz,
                yield_percent: 100.0,
                items: vec![],
                utility_factor: 2.0,
                selling_price: None,
            })
            .await;

        assert!(matches!(result, Err(CostingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_refresh_saves_only_changed_figures() {
        let tomato = ingredient(4.0, Unit::Pz);
        let stale = recipe(vec![CompositionEntry::ingredient(tomato.id, 1.0, None)]);
        let mut current = recipe(vec![CompositionEntry::ingredient(tomato.id, 2.0, None)]);
        current.apply_figures(RecipeFigures {
            total_cost: 8.0,
            cost_per_portion: 4.0,
            suggested_price: 12.0,
        });
        let stale_id = stale.id;

        let mut mock_repo = mock_catalog(vec![tomato], vec![], vec![stale.clone(), current]);
        mock_repo
            .expect_save_recipe_figures()
            .with(
                eq(stale_id),
                eq(RecipeFigures {
                    total_cost: 4.0,
                    cost_per_portion: 2.0,
                    suggested_price: 6.0,
                }),
            )
            .times(1)
            .returning(move |_, figures| {
                let mut saved = stale.clone();
                saved.apply_figures(figures);
                Ok(saved)
            });

        let service = CostingService::new(mock_repo);
        service.refresh_recipe_figures().await.unwrap();
    }

    #[tokio::test]
    async fn test_component_candidates_exclude_edited_sub_recipe() {
        let tomato = ingredient(4.0, Unit::Kg);
        let mut retired = ingredient(9.0, Unit::Kg);
        retired.is_active = false;

        let sauce = SubRecipe {
            id: Uuid::now_v7(),
            name: "Sauce".to_string(),
            unit: Unit::Lt,
            yield_quantity: YieldQuantity::new(2.0),
            items: vec![CompositionEntry::ingredient(tomato.id, 1.0, None)],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut pesto = sauce.clone();
        pesto.id = Uuid::now_v7();
        pesto.name = "Pesto".to_string();
        let sauce_id = sauce.id;

        let service = CostingService::new(mock_catalog(
            vec![tomato.clone(), retired],
            vec![sauce, pesto.clone()],
            vec![],
        ));
        let candidates = service.component_candidates(Some(sauce_id)).await.unwrap();

        assert_eq!(candidates.ingredients.len(), 1);
        assert_eq!(candidates.ingredients[0].id, tomato.id);
        assert_eq!(candidates.sub_recipes.len(), 1);
        assert_eq!(candidates.sub_recipes[0].id, pesto.id);
        assert!((candidates.sub_recipes[0].unit_cost - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_delete_missing_recipe_is_not_found() {
        let mut mock_repo = MockCatalogRepository::new();
        let id = Uuid::now_v7();
        mock_repo
            .expect_delete_recipe()
            .with(eq(id))
            .returning(|_| Ok(false));

        let service = CostingService::new(mock_repo);
        let result = service.delete_recipe(id).await;

        assert!(matches!(result, Err(CostingError::NotFound { .. })));
    }
}
