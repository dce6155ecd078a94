use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::diet::ingredients::IngredientTotal;
use crate::diet::model::{iso_date, MeasurementUnit, OrderStatus, PlannedMeal};

/// Body of `POST /save-diet-data`.
#[derive(Debug, Deserialize)]
pub struct SaveDietRequest {
    #[serde(rename = "orderID")]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    pub diet_data: Option<Vec<DayPayload>>,
}

#[derive(Debug, Deserialize)]
pub struct DayPayload {
    pub date: Option<String>,
    #[serde(default)]
    pub meals: Vec<MealPayload>,
}

#[derive(Debug, Deserialize)]
pub struct MealPayload {
    /// Empty string is treated like a missing uuid.
    #[serde(default)]
    pub uuid: Option<String>,
    pub meal_type: Option<String>,
    pub id: Option<i64>,
    #[serde(default)]
    pub grams: Option<i32>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditorQuery {
    #[serde(rename = "orderID")]
    pub order_id: Option<i64>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngredientRow {
    #[serde(rename = "ingredient__name")]
    pub name: String,
    pub total_quantity: f64,
    #[serde(rename = "ingredient__measurement_unit")]
    pub unit: MeasurementUnit,
}

impl From<IngredientTotal> for IngredientRow {
    fn from(t: IngredientTotal) -> Self {
        Self {
            name: t.name,
            total_quantity: t.total_quantity,
            unit: t.unit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngredientsResponse {
    pub ingredients: Vec<IngredientRow>,
}

/// A scheduled meal as shown to the client.
#[derive(Debug, Serialize)]
pub struct PlannedMealView {
    pub id: i64,
    pub name: String,
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<String>,
    pub quantity: i32,
    pub unit: MeasurementUnit,
    pub short_description: String,
    pub calories: i32,
    pub calories_per_100g: i32,
    pub default_grams: i32,
    pub carbohydrates: i32,
    pub fats: i32,
    pub protein: i32,
    pub preparation_time: i32,
    pub image_url: Option<String>,
}

impl PlannedMealView {
    pub fn from_planned(p: PlannedMeal, with_type: bool) -> Self {
        let PlannedMeal { entry, meal } = p;
        Self {
            id: meal.id,
            name: meal.name,
            uuid: entry.uuid,
            meal_type: with_type.then(|| String::from(entry.meal_type)),
            quantity: entry.quantity,
            unit: entry.unit,
            short_description: meal.short_description,
            calories: meal.calories,
            calories_per_100g: meal.calories_per_100g,
            default_grams: meal.default_grams,
            carbohydrates: meal.carbohydrates,
            fats: meal.fats,
            protein: meal.protein,
            preparation_time: meal.preparation_time,
            image_url: meal.image_url,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct MealBuckets {
    pub breakfast: Vec<PlannedMealView>,
    pub lunch: Vec<PlannedMealView>,
    pub dinner: Vec<PlannedMealView>,
    pub afternoon_snack: Vec<PlannedMealView>,
    pub evening_snack: Vec<PlannedMealView>,
}

#[derive(Debug, Serialize)]
pub struct BucketedDay {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: MealBuckets,
}

#[derive(Debug, Serialize)]
pub struct OrderInfo {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub status: OrderStatus,
    pub dieta: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DietPlansResponse {
    pub preferences_set: bool,
    pub order_info: OrderInfo,
    pub days: Vec<BucketedDay>,
}

#[derive(Debug, Serialize)]
pub struct DietPlanDetails {
    pub user_id: Uuid,
    pub diet_id: i64,
    pub diet_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub diet_start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub diet_end_date: Option<OffsetDateTime>,
    pub gluten_free: bool,
    pub lactose_free: bool,
    pub nut_free: bool,
    pub fish_free: bool,
    pub soy_free: bool,
    /// Dishes scored "preferred".
    pub food_preferences_1: Vec<String>,
    /// Dishes scored "avoid".
    pub food_preferences_2: Vec<String>,
    pub status: OrderStatus,
    pub calories: i32,
}

#[derive(Debug, Serialize)]
pub struct EditorDay {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub meals: Vec<PlannedMealView>,
}

#[derive(Debug, Serialize)]
pub struct DietEditorResponse {
    pub diet_plan: DietPlanDetails,
    pub days: Vec<EditorDay>,
}
