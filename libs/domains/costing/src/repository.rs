use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CostingError, CostingResult};
use crate::models::{
    CatalogSnapshot, Category, CreateCategory, CreateIngredient, CreateRecipe, CreateSubRecipe,
    EntityKind, Ingredient, Recipe, RecipeFigures, SubRecipe, UpdateIngredient, UpdateRecipe,
    UpdateSubRecipe,
};

/// Repository trait for catalog persistence
///
/// Lists return records in insertion order; the resolver keeps that order in
/// its output.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_ingredients(&self) -> CostingResult<Vec<Ingredient>>;

    async fn get_ingredient(&self, id: Uuid) -> CostingResult<Option<Ingredient>>;

    async fn create_ingredient(&self, input: CreateIngredient) -> CostingResult<Ingredient>;

    async fn update_ingredient(
        &self,
        id: Uuid,
        input: UpdateIngredient,
    ) -> CostingResult<Ingredient>;

    async fn delete_ingredient(&self, id: Uuid) -> CostingResult<bool>;

    async fn list_sub_recipes(&self) -> CostingResult<Vec<SubRecipe>>;

    async fn get_sub_recipe(&self, id: Uuid) -> CostingResult<Option<SubRecipe>>;

    async fn create_sub_recipe(&self, input: CreateSubRecipe) -> CostingResult<SubRecipe>;

    async fn update_sub_recipe(
        &self,
        id: Uuid,
        input: UpdateSubRecipe,
    ) -> CostingResult<SubRecipe>;

    async fn delete_sub_recipe(&self, id: Uuid) -> CostingResult<bool>;

    async fn list_recipes(&self) -> CostingResult<Vec<Recipe>>;

    async fn get_recipe(&self, id: Uuid) -> CostingResult<Option<Recipe>>;

    async fn create_recipe(&self, input: CreateRecipe) -> CostingResult<Recipe>;

    async fn update_recipe(&self, id: Uuid, input: UpdateRecipe) -> CostingResult<Recipe>;

    /// Store the cached total, cost per portion and suggested price
    async fn save_recipe_figures(&self, id: Uuid, figures: RecipeFigures)
    -> CostingResult<Recipe>;

    async fn delete_recipe(&self, id: Uuid) -> CostingResult<bool>;

    async fn list_categories(&self) -> CostingResult<Vec<Category>>;

    async fn create_category(&self, input: CreateCategory) -> CostingResult<Category>;

    async fn delete_category(&self, id: Uuid) -> CostingResult<bool>;
}

/// In-memory implementation of CatalogRepository, seeded from a snapshot
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalogRepository {
    catalog: Arc<RwLock<CatalogSnapshot>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Copy of the current catalog
    pub async fn snapshot(&self) -> CatalogSnapshot {
        self.catalog.read().await.clone()
    }
}

fn remove_by_id<T>(records: &mut Vec<T>, id: Uuid, id_of: impl Fn(&T) -> Uuid) -> bool {
    let before = records.len();
    records.retain(|record| id_of(record) != id);
    records.len() != before
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_ingredients(&self) -> CostingResult<Vec<Ingredient>> {
        Ok(self.catalog.read().await.ingredients.clone())
    }

    async fn get_ingredient(&self, id: Uuid) -> CostingResult<Option<Ingredient>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.ingredients.iter().find(|i| i.id == id).cloned())
    }

    async fn create_ingredient(&self, input: CreateIngredient) -> CostingResult<Ingredient> {
        let ingredient = Ingredient::new(input);
        self.catalog.write().await.ingredients.push(ingredient.clone());

        tracing::info!(ingredient_id = %ingredient.id, "Created ingredient");
        Ok(ingredient)
    }

    async fn update_ingredient(
        &self,
        id: Uuid,
        input: UpdateIngredient,
    ) -> CostingResult<Ingredient> {
        let mut catalog = self.catalog.write().await;
        let ingredient = catalog
            .ingredients
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(CostingError::not_found(EntityKind::Ingredient, id))?;
        ingredient.apply_update(input);

        tracing::info!(ingredient_id = %id, "Updated ingredient");
        Ok(ingredient.clone())
    }

    async fn delete_ingredient(&self, id: Uuid) -> CostingResult<bool> {
        let mut catalog = self.catalog.write().await;
        let deleted = remove_by_id(&mut catalog.ingredients, id, |i| i.id);
        if deleted {
            tracing::info!(ingredient_id = %id, "Deleted ingredient");
        }
        Ok(deleted)
    }

    async fn list_sub_recipes(&self) -> CostingResult<Vec<SubRecipe>> {
        Ok(self.catalog.read().await.sub_recipes.clone())
    }

    async fn get_sub_recipe(&self, id: Uuid) -> CostingResult<Option<SubRecipe>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.sub_recipes.iter().find(|s| s.id == id).cloned())
    }

    async fn create_sub_recipe(&self, input: CreateSubRecipe) -> CostingResult<SubRecipe> {
        let sub_recipe = SubRecipe::new(input);
        self.catalog.write().await.sub_recipes.push(sub_recipe.clone());

        tracing::info!(sub_recipe_id = %sub_recipe.id, "Created sub-recipe");
        Ok(sub_recipe)
    }

    async fn update_sub_recipe(
        &self,
        id: Uuid,
        input: UpdateSubRecipe,
    ) -> CostingResult<SubRecipe> {
        let mut catalog = self.catalog.write().await;
        let sub_recipe = catalog
            .sub_recipes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(CostingError::not_found(EntityKind::SubRecipe, id))?;
        sub_recipe.apply_update(input);

        tracing::info!(sub_recipe_id = %id, "Updated sub-recipe");
        Ok(sub_recipe.clone())
    }

    async fn delete_sub_recipe(&self, id: Uuid) -> CostingResult<bool> {
        let mut catalog = self.catalog.write().await;
        let deleted = remove_by_id(&mut catalog.sub_recipes, id, |s| s.id);
        if deleted {
            tracing::info!(sub_recipe_id = %id, "Deleted sub-recipe");
        }
        Ok(deleted)
    }

    async fn list_recipes(&self) -> CostingResult<Vec<Recipe>> {
        Ok(self.catalog.read().await.recipes.clone())
    }

    async fn get_recipe(&self, id: Uuid) -> CostingResult<Option<Recipe>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn create_recipe(&self, input: CreateRecipe) -> CostingResult<Recipe> {
        let recipe = Recipe::new(input);
        self.catalog.write().await.recipes.push(recipe.clone());

        tracing::info!(recipe_id = %recipe.id, "Created recipe");
        Ok(recipe)
    }

    async fn update_recipe(&self, id: Uuid, input: UpdateRecipe) -> CostingResult<Recipe> {
        let mut catalog = self.catalog.write().await;
        let recipe = catalog
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CostingError::not_found(EntityKind::Recipe, id))?;
        recipe.apply_update(input);

        tracing::info!(recipe_id = %id, "Updated recipe");
        Ok(recipe.clone())
    }

    async fn save_recipe_figures(
        &self,
        id: Uuid,
        figures: RecipeFigures,
    ) -> CostingResult<Recipe> {
        let mut catalog = self.catalog.write().await;
        let recipe = catalog
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(CostingError::not_found(EntityKind::Recipe, id))?;
        recipe.apply_figures(figures);

        tracing::debug!(recipe_id = %id, total_cost = figures.total_cost, "Saved recipe figures");
        Ok(recipe.clone())
    }

    async fn delete_recipe(&self, id: Uuid) -> CostingResult<bool> {
        let mut catalog = self.catalog.write().await;
        let deleted = remove_by_id(&mut catalog.recipes, id, |r| r.id);
        if deleted {
            tracing::info!(recipe_id = %id, "Deleted recipe");
        }
        Ok(deleted)
    }

    async fn list_categories(&self) -> CostingResult<Vec<Category>> {
        Ok(self.catalog.read().await.categories.clone())
    }

    async fn create_category(&self, input: CreateCategory) -> CostingResult<Category> {
        let category = Category::new(input);
        self.catalog.write().await.categories.push(category.clone());

        tracing::info!(category_id = %category.id, "Created category");
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> CostingResult<bool> {
        let mut catalog = self.catalog.write().await;
        Ok(remove_by_id(&mut catalog.categories, id, |c| c.id))
    }
}
