use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body POSTed to the external generator.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub user: Uuid,
    /// Diet type label of the subscription.
    pub name: String,
    pub user_diet: i64,
    /// Months.
    pub duration: i32,
    pub meals_per_day: i32,
    pub not_preferred_ingredients: Vec<String>,
    pub allergens_to_avoid: Vec<String>,
    pub max_calories: i32,
    pub user_weight: f64,
    pub callback_url: String,
}

/// Finished plan delivered by the generator. Required fields are checked
/// by the service so a missing one answers 400 rather than 422.
#[derive(Debug, Deserialize)]
pub struct PlanCallback {
    pub user_id: Option<Uuid>,
    pub user_diet: Option<i64>,
    pub diet_plan: Option<Vec<GeneratedDay>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedDay {
    pub date: String,
    #[serde(default)]
    pub total_calories: Option<f64>,
    #[serde(default)]
    pub meals: Vec<GeneratedMeal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedMeal {
    #[serde(alias = "meal_name")]
    pub name: String,
    pub meal_type: String,
    pub portions: f64,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct CallbackReport {
    pub message: String,
    pub days: usize,
    pub meals_created: usize,
    pub meals_skipped: usize,
}
