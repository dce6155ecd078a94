use serde::{Deserialize, Serialize};

use crate::diet::model::Meal;

#[derive(Debug, Serialize)]
pub struct MealDetails {
    pub id: i64,
    pub name: String,
    pub long_description: String,
    pub calories: i32,
    pub calories_per_100g: i32,
    pub default_grams: i32,
    pub carbohydrates: i32,
    pub fats: i32,
    pub protein: i32,
    pub preparation_time: i32,
    pub image_url: Option<String>,
}

impl From<Meal> for MealDetails {
    fn from(m: Meal) -> Self {
        Self {
            id: m.id,
            name: m.name,
            long_description: m.long_description,
            calories: m.calories,
            calories_per_100g: m.calories_per_100g,
            default_grams: m.default_grams,
            carbohydrates: m.carbohydrates,
            fats: m.fats,
            protein: m.protein,
            preparation_time: m.preparation_time,
            image_url: m.image_url,
        }
    }
}

/// Search hit. Allergen flags are reported as stored on the meal.
#[derive(Debug, Serialize)]
pub struct MealSearchItem {
    #[serde(flatten)]
    pub details: MealDetails,
    /// Reference serving the calories are quoted for.
    pub grams: i32,
    pub lactose_free: bool,
    pub nut_free: bool,
    pub soy_free: bool,
    pub gluten_free: bool,
    pub fish_free: bool,
}

impl From<Meal> for MealSearchItem {
    fn from(m: Meal) -> Self {
        let (lactose, nut, soy, gluten, fish) = (m.lactose, m.nut, m.soy, m.gluten, m.fish);
        Self {
            details: m.into(),
            grams: 100,
            lactose_free: lactose,
            nut_free: nut,
            soy_free: soy,
            gluten_free: gluten,
            fish_free: fish,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}
