use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;
use validator::Validate;

use crate::lenient;

/// Unit of purchase or usage.
///
/// Only mass (kg/gr) and volume (lt/ml) pairs convert into each other.
/// Anything the catalog uses beyond the known units is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Unit {
    Kg,
    Gr,
    Lt,
    Ml,
    /// Pieces
    #[default]
    Pz,
    Other(String),
}

impl Unit {
    pub fn as_str(&self) -> &str {
        match self {
            Unit::Kg => "kg",
            Unit::Gr => "gr",
            Unit::Lt => "lt",
            Unit::Ml => "ml",
            Unit::Pz => "pz",
            Unit::Other(unit) => unit,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<String> for Unit {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Unit::default(),
            "kg" => Unit::Kg,
            "gr" => Unit::Gr,
            "lt" => Unit::Lt,
            "ml" => Unit::Ml,
            "pz" => Unit::Pz,
            _ => Unit::Other(trimmed.to_string()),
        }
    }
}

impl From<&str> for Unit {
    fn from(value: &str) -> Self {
        Unit::from(value.to_string())
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}

/// Share of a purchased quantity that survives trimming and prep (0–100).
///
/// Used by ingredients and recipes. 80 means 20% is lost.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YieldPercentage(f64);

impl YieldPercentage {
    pub const FULL: YieldPercentage = YieldPercentage(100.0);

    pub fn new(percent: f64) -> Self {
        Self(percent)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for YieldPercentage {
    fn default() -> Self {
        Self::FULL
    }
}

/// Output quantity of a sub-recipe batch, in the sub-recipe's unit.
///
/// Not a percentage: "this batch yields 5 lt".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YieldQuantity(f64);

impl YieldQuantity {
    pub fn new(quantity: f64) -> Self {
        Self(quantity)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Divisor used to spread a batch cost over its output.
    ///
    /// A batch without a usable output counts as a single unit, so the unit
    /// cost equals the batch cost.
    pub fn divisor(self) -> f64 {
        if self.0.is_finite() && self.0 > 0.0 {
            self.0
        } else {
            1.0
        }
    }
}

/// Kind of catalog item a composition entry points at.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemKind {
    #[serde(alias = "Ingredient")]
    Ingredient,
    #[serde(alias = "SubRecipe", alias = "subRecipe")]
    SubRecipe,
}

/// Catalog entity kinds, used in errors and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Ingredient,
    SubRecipe,
    Recipe,
    Category,
}

impl From<ItemKind> for EntityKind {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Ingredient => EntityKind::Ingredient,
            ItemKind::SubRecipe => EntityKind::SubRecipe,
        }
    }
}

/// Reference to a component, either a bare id or a document populated by the
/// store with the referenced item's fields.
///
/// A reference the store could not populate (the item was deleted) arrives as
/// `null`; it and any id that does not parse become `Missing`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum ComponentRef {
    Id(Uuid),
    Populated(PopulatedComponent),
    #[default]
    Missing,
}

impl<'de> Deserialize<'de> for ComponentRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(raw)) => Uuid::parse_str(raw.trim())
                .map(ComponentRef::Id)
                .unwrap_or(ComponentRef::Missing),
            Some(doc @ serde_json::Value::Object(_)) => serde_json::from_value(doc)
                .map(ComponentRef::Populated)
                .unwrap_or(ComponentRef::Missing),
            _ => ComponentRef::Missing,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulatedComponent {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ComponentRef {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            ComponentRef::Id(id) => Some(*id),
            ComponentRef::Populated(doc) => Some(doc.id),
            ComponentRef::Missing => None,
        }
    }

    /// Name carried by a populated document, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            ComponentRef::Populated(doc) => doc.fields.get("name").and_then(|v| v.as_str()),
            ComponentRef::Id(_) | ComponentRef::Missing => None,
        }
    }
}

impl From<Uuid> for ComponentRef {
    fn from(id: Uuid) -> Self {
        ComponentRef::Id(id)
    }
}

/// One (item, quantity) pair of a sub-recipe or recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CompositionEntry {
    #[serde(default)]
    pub item: ComponentRef,
    /// Absent in older documents; the item is then looked up among
    /// ingredients first, then sub-recipes
    #[serde(
        default,
        alias = "itemType",
        alias = "item_type",
        deserialize_with = "lenient::item_kind",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<ItemKind>,
    /// Usage quantity, in `unit` (or the item's own unit when absent)
    #[serde(default, deserialize_with = "lenient::number")]
    #[validate(range(min = 0.0))]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl CompositionEntry {
    pub fn ingredient(id: Uuid, quantity: f64, unit: Option<Unit>) -> Self {
        Self {
            item: ComponentRef::Id(id),
            kind: Some(ItemKind::Ingredient),
            quantity: Some(quantity),
            unit,
        }
    }

    pub fn sub_recipe(id: Uuid, quantity: f64, unit: Option<Unit>) -> Self {
        Self {
            item: ComponentRef::Id(id),
            kind: Some(ItemKind::SubRecipe),
            quantity: Some(quantity),
            unit,
        }
    }

    /// `None` when the reference is missing
    pub fn item_id(&self) -> Option<Uuid> {
        self.item.id()
    }
}

fn default_true() -> bool {
    true
}

fn default_yield_percent() -> f64 {
    100.0
}

/// Purchased ingredient, the leaf of every composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    /// Base unit of purchase
    #[serde(default)]
    pub unit: Unit,
    /// Price per base unit
    #[serde(default, deserialize_with = "lenient::number")]
    pub cost: Option<f64>,
    #[serde(
        rename = "yield",
        default,
        deserialize_with = "lenient::yield_percentage"
    )]
    pub yield_percent: YieldPercentage,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true", alias = "isActive")]
    pub is_active: bool,
    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Intermediate preparation (stock, sauce, dough) built from ingredients and
/// other sub-recipes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubRecipe {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    /// Unit the yield is expressed in
    #[serde(default)]
    pub unit: Unit,
    #[serde(
        rename = "yield",
        default,
        deserialize_with = "lenient::yield_quantity"
    )]
    pub yield_quantity: YieldQuantity,
    #[serde(default)]
    pub items: Vec<CompositionEntry>,
    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Finished dish sold by portion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub category: Option<Uuid>,
    /// Number of portions produced
    #[serde(default, deserialize_with = "lenient::number")]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Unit,
    #[serde(
        rename = "yield",
        default,
        deserialize_with = "lenient::yield_percentage"
    )]
    pub yield_percent: YieldPercentage,
    #[serde(default)]
    pub items: Vec<CompositionEntry>,
    /// Markup multiplier applied to the cost per portion
    #[serde(default, alias = "utilityFactor", deserialize_with = "lenient::number")]
    pub utility_factor: Option<f64>,
    /// Price set by the owner; wins over the computed suggestion for display
    #[serde(default, alias = "sellingPrice", deserialize_with = "lenient::number")]
    pub selling_price: Option<f64>,
    /// Figures cached at the last write; never used as costing input
    #[serde(default, alias = "totalCost", deserialize_with = "lenient::number")]
    pub total_cost: Option<f64>,
    #[serde(default, alias = "costPerPortion", deserialize_with = "lenient::number")]
    pub cost_per_portion: Option<f64>,
    #[serde(default, alias = "suggestedPrice", deserialize_with = "lenient::number")]
    pub suggested_price: Option<f64>,
    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Display grouping for recipes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "Utc::now", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Derived recipe figures stored alongside the recipe after each write
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecipeFigures {
    pub total_cost: f64,
    pub cost_per_portion: f64,
    pub suggested_price: f64,
}

/// DTO for creating an ingredient
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIngredient {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub unit: Unit,
    #[validate(range(min = 0.0))]
    pub cost: f64,
    #[serde(rename = "yield", default = "default_yield_percent")]
    #[validate(range(exclusive_min = 0.0, max = 100.0))]
    pub yield_percent: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// DTO for updating an ingredient
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateIngredient {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub unit: Option<Unit>,
    #[validate(range(min = 0.0))]
    pub cost: Option<f64>,
    #[serde(rename = "yield")]
    #[validate(range(exclusive_min = 0.0, max = 100.0))]
    pub yield_percent: Option<f64>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// DTO for creating a sub-recipe
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubRecipe {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub unit: Unit,
    #[serde(rename = "yield")]
    #[validate(range(exclusive_min = 0.0))]
    pub yield_quantity: f64,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<CompositionEntry>,
}

/// DTO for updating a sub-recipe; `items` replaces the whole composition
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSubRecipe {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub unit: Option<Unit>,
    #[serde(rename = "yield")]
    #[validate(range(exclusive_min = 0.0))]
    pub yield_quantity: Option<f64>,
    #[validate(nested)]
    pub items: Option<Vec<CompositionEntry>>,
}

/// DTO for creating a recipe
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRecipe {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub category: Option<Uuid>,
    /// Portions produced
    #[validate(range(exclusive_min = 0.0))]
    pub quantity: f64,
    #[serde(default)]
    pub unit: Unit,
    #[serde(rename = "yield", default = "default_yield_percent")]
    #[validate(range(exclusive_min = 0.0, max = 100.0))]
    pub yield_percent: f64,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<CompositionEntry>,
    #[validate(range(exclusive_min = 0.0))]
    pub utility_factor: f64,
    #[validate(range(min = 0.0))]
    pub selling_price: Option<f64>,
}

/// DTO for updating a recipe; `items` replaces the whole composition
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRecipe {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub category: Option<Uuid>,
    #[validate(range(exclusive_min = 0.0))]
    pub quantity: Option<f64>,
    pub unit: Option<Unit>,
    #[serde(rename = "yield")]
    #[validate(range(exclusive_min = 0.0, max = 100.0))]
    pub yield_percent: Option<f64>,
    #[validate(nested)]
    pub items: Option<Vec<CompositionEntry>>,
    #[validate(range(exclusive_min = 0.0))]
    pub utility_factor: Option<f64>,
    #[validate(range(min = 0.0))]
    pub selling_price: Option<f64>,
}

/// DTO for creating a category
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub description: String,
}

/// Whole catalog as exported from the document store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, alias = "subRecipes", alias = "subrecipes")]
    pub sub_recipes: Vec<SubRecipe>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl CatalogSnapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Ingredient {
    pub fn new(input: CreateIngredient) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            unit: input.unit,
            cost: Some(input.cost),
            yield_percent: YieldPercentage::new(input.yield_percent),
            category: input.category,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: UpdateIngredient) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
        if let Some(cost) = update.cost {
            self.cost = Some(cost);
        }
        if let Some(yield_percent) = update.yield_percent {
            self.yield_percent = YieldPercentage::new(yield_percent);
        }
        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

impl SubRecipe {
    pub fn new(input: CreateSubRecipe) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            unit: input.unit,
            yield_quantity: YieldQuantity::new(input.yield_quantity),
            items: input.items,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: UpdateSubRecipe) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
        if let Some(yield_quantity) = update.yield_quantity {
            self.yield_quantity = YieldQuantity::new(yield_quantity);
        }
        if let Some(items) = update.items {
            self.items = items;
        }
        self.updated_at = Utc::now();
    }
}

impl Recipe {
    pub fn new(input: CreateRecipe) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            category: input.category,
            quantity: Some(input.quantity),
            unit: input.unit,
            yield_percent: YieldPercentage::new(input.yield_percent),
            items: input.items,
            utility_factor: Some(input.utility_factor),
            selling_price: input.selling_price,
            total_cost: None,
            cost_per_portion: None,
            suggested_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: UpdateRecipe) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(quantity) = update.quantity {
            self.quantity = Some(quantity);
        }
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
        if let Some(yield_percent) = update.yield_percent {
            self.yield_percent = YieldPercentage::new(yield_percent);
        }
        if let Some(items) = update.items {
            self.items = items;
        }
        if let Some(utility_factor) = update.utility_factor {
            self.utility_factor = Some(utility_factor);
        }
        if let Some(selling_price) = update.selling_price {
            self.selling_price = Some(selling_price);
        }
        self.updated_at = Utc::now();
    }

    /// Figures stored by the last write, when all three are present
    pub fn cached_figures(&self) -> Option<RecipeFigures> {
        Some(RecipeFigures {
            total_cost: self.total_cost?,
            cost_per_portion: self.cost_per_portion?,
            suggested_price: self.suggested_price?,
        })
    }

    pub fn apply_figures(&mut self, figures: RecipeFigures) {
        self.total_cost = Some(figures.total_cost);
        self.cost_per_portion = Some(figures.cost_per_portion);
        self.suggested_price = Some(figures.suggested_price);
        self.updated_at = Utc::now();
    }
}

impl Category {
    pub fn new(input: CreateCategory) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            created_at: Utc::now(),
        }
    }
}

/// Data-quality problem found while resolving costs.
///
/// Warnings never abort a pass; the affected line contributes zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CostWarning {
    /// A composition entry points at an id missing from the catalog
    DanglingReference {
        owner: Uuid,
        /// `None` when the stored reference was null or unreadable
        item: Option<Uuid>,
        item_kind: ItemKind,
    },
    /// A composition entry closes a cycle of sub-recipes
    CycleDetected { owner: Uuid, item: Uuid },
    /// A recipe has no usable utility factor; suggested price is zero
    MissingUtilityFactor { recipe: Uuid },
}

impl CostWarning {
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Entity whose figures are affected
    pub fn owner(&self) -> Uuid {
        match self {
            CostWarning::DanglingReference { owner, .. } => *owner,
            CostWarning::CycleDetected { owner, .. } => *owner,
            CostWarning::MissingUtilityFactor { recipe } => *recipe,
        }
    }
}

impl fmt::Display for CostWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostWarning::DanglingReference {
                owner,
                item: Some(item),
                item_kind,
            } => write!(f, "{owner} references missing {item_kind} {item}"),
            CostWarning::DanglingReference {
                owner,
                item: None,
                item_kind,
            } => write!(f, "{owner} references an unreadable {item_kind}"),
            CostWarning::CycleDetected { owner, item } => {
                write!(f, "{owner} references sub_recipe {item} in a cycle")
            }
            CostWarning::MissingUtilityFactor { recipe } => {
                write!(f, "recipe {recipe} has no usable utility factor")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_parsing_is_case_insensitive() {
        assert_eq!(Unit::from("KG"), Unit::Kg);
        assert_eq!(Unit::from("Gr"), Unit::Gr);
        assert_eq!(Unit::from(" lt "), Unit::Lt);
        assert_eq!(Unit::from("ML"), Unit::Ml);
        assert_eq!(Unit::from("pz"), Unit::Pz);
    }

    #[test]
    fn test_unknown_unit_is_kept_verbatim() {
        let unit = Unit::from("bunch");
        assert_eq!(unit, Unit::Other("bunch".to_string()));
        assert_eq!(unit.to_string(), "bunch");
        assert_eq!(Unit::from(""), Unit::Pz);
    }

    #[test]
    fn test_unit_serde_uses_plain_strings() {
        let json = serde_json::to_string(&Unit::Kg).unwrap();
        assert_eq!(json, "\"kg\"");
        let unit: Unit = serde_json::from_str("\"Ml\"").unwrap();
        assert_eq!(unit, Unit::Ml);
    }

    #[test]
    fn test_yield_quantity_divisor() {
        assert_eq!(YieldQuantity::new(5.0).divisor(), 5.0);
        assert_eq!(YieldQuantity::new(0.0).divisor(), 1.0);
        assert_eq!(YieldQuantity::new(-2.0).divisor(), 1.0);
        assert_eq!(YieldQuantity::default().divisor(), 1.0);
    }

    #[test]
    fn test_component_ref_accepts_both_shapes() {
        let id = Uuid::now_v7();

        let bare: CompositionEntry = serde_json::from_value(serde_json::json!({
            "item": id.to_string(),
            "kind": "ingredient",
            "quantity": 2
        }))
        .unwrap();
        assert_eq!(bare.item_id(), Some(id));
        assert_eq!(bare.item.name(), None);

        let populated: CompositionEntry = serde_json::from_value(serde_json::json!({
            "item": { "_id": id.to_string(), "name": "Tomato", "cost": 12 },
            "itemType": "Ingredient",
            "quantity": "0.5"
        }))
        .unwrap();
        assert_eq!(populated.item_id(), Some(id));
        assert_eq!(populated.item.name(), Some("Tomato"));
        assert_eq!(populated.kind, Some(ItemKind::Ingredient));
        assert_eq!(populated.quantity, Some(0.5));
    }

    #[test]
    fn test_unreadable_reference_is_missing() {
        let entries: Vec<CompositionEntry> = serde_json::from_value(serde_json::json!([
            { "item": null, "kind": "ingredient", "quantity": 1 },
            { "item": "not-an-id", "quantity": 1 },
            { "item": { "name": "No id" }, "quantity": 1 },
            { "quantity": 1 }
        ]))
        .unwrap();

        for entry in &entries {
            assert_eq!(entry.item, ComponentRef::Missing);
            assert_eq!(entry.item_id(), None);
        }
        assert_eq!(entries[1].kind, None);
        assert_eq!(
            serde_json::to_value(&entries[0]).unwrap()["item"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_item_kind_accepts_document_store_spelling() {
        let kind: ItemKind = serde_json::from_str("\"SubRecipe\"").unwrap();
        assert_eq!(kind, ItemKind::SubRecipe);
        let kind: ItemKind = serde_json::from_str("\"sub_recipe\"").unwrap();
        assert_eq!(kind, ItemKind::SubRecipe);
    }

    #[test]
    fn test_ingredient_defaults() {
        let id = Uuid::now_v7();
        let ingredient: Ingredient = serde_json::from_value(serde_json::json!({
            "_id": id.to_string(),
            "name": "Onion",
            "unit": "KG",
            "cost": "abc"
        }))
        .unwrap();

        assert_eq!(ingredient.unit, Unit::Kg);
        assert_eq!(ingredient.cost, None);
        assert_eq!(ingredient.yield_percent, YieldPercentage::FULL);
        assert!(ingredient.is_active);
    }

    #[test]
    fn test_create_recipe_rejects_zero_utility_factor() {
        let input = CreateRecipe {
            name: "Soup".to_string(),
            category: None,
            quantity: 4.0,
            unit: Unit::Pz,
            yield_percent: 100.0,
            items: vec![],
            utility_factor: 0.0,
            selling_price: None,
        };
        assert!(input.validate().is_err());

        let input = CreateRecipe {
            utility_factor: 2.5,
            ..input
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_ingredient_rejects_out_of_range_yield() {
        let input = CreateIngredient {
            name: "Fish".to_string(),
            unit: Unit::Kg,
            cost: 10.0,
            yield_percent: 0.0,
            category: None,
            is_active: true,
        };
        assert!(input.validate().is_err());

        let input = CreateIngredient {
            yield_percent: 120.0,
            ..input
        };
        assert!(input.validate().is_err());

        let input = CreateIngredient {
            yield_percent: 60.0,
            ..input
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_nested_entries_are_validated() {
        let input = CreateSubRecipe {
            name: "Stock".to_string(),
            unit: Unit::Lt,
            yield_quantity: 5.0,
            items: vec![CompositionEntry::ingredient(Uuid::now_v7(), -1.0, None)],
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_recipe_update_replaces_items() {
        let mut recipe = Recipe::new(CreateRecipe {
            name: "Tacos".to_string(),
            category: None,
            quantity: 2.0,
            unit: Unit::Pz,
            yield_percent: 100.0,
            items: vec![
                CompositionEntry::ingredient(Uuid::now_v7(), 1.0, None),
                CompositionEntry::ingredient(Uuid::now_v7(), 2.0, None),
            ],
            utility_factor: 3.0,
            selling_price: None,
        });

        let replacement = CompositionEntry::ingredient(Uuid::now_v7(), 5.0, None);
        recipe.apply_update(UpdateRecipe {
            items: Some(vec![replacement.clone()]),
            ..Default::default()
        });

        assert_eq!(recipe.items, vec![replacement]);
        assert_eq!(recipe.utility_factor, Some(3.0));
    }

    #[test]
    fn test_warning_kind_labels() {
        let warning = CostWarning::MissingUtilityFactor {
            recipe: Uuid::nil(),
        };
        assert_eq!(warning.kind(), "missing_utility_factor");
        assert_eq!(warning.owner(), Uuid::nil());
    }
}
