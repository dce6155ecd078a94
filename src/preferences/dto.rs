use std::collections::BTreeMap;

use serde::Deserialize;

use crate::diet::model::{ActivityLevel, Gender};

/// Body of `POST /diet-preferences`. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct PreferencesRequest {
    pub diet_id: Option<i64>,
    #[serde(rename = "orderID")]
    pub order_id: Option<i64>,
    #[serde(rename = "dietType")]
    pub diet_type: Option<String>,
    #[serde(rename = "mealCount")]
    pub meal_count: Option<i32>,
    #[serde(default)]
    pub preferences: RestrictionFlags,
    pub preferences_set: Option<bool>,
    #[serde(rename = "foodPreferences")]
    pub food_preferences: Option<BTreeMap<String, i64>>,
    pub gender: Option<Gender>,
    pub age: Option<i32>,
    pub weight: Option<f64>,
    pub height: Option<i32>,
    pub activity_level: Option<ActivityLevel>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RestrictionFlags {
    #[serde(alias = "glutenFree")]
    pub gluten_free: Option<bool>,
    #[serde(alias = "lactoseFree")]
    pub lactose_free: Option<bool>,
    #[serde(alias = "nutFree")]
    pub nut_free: Option<bool>,
    #[serde(alias = "fishFree")]
    pub fish_free: Option<bool>,
    #[serde(alias = "soyFree")]
    pub soy_free: Option<bool>,
}
