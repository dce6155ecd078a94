use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

/// Parses a `YYYY-MM-DD` date.
pub fn parse_iso_date(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
}

pub fn format_iso_date(date: Date) -> String {
    // The format has no fallible components.
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// `#[serde(with = "iso_date")]` for `YYYY-MM-DD` dates.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_iso_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_iso_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Food-preference scores as stored in `food_preferences`.
pub mod score {
    pub const AVOID: i64 = 0;
    pub const PREFERRED: i64 = 2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MeasurementUnit {
    Grams,
    Pieces,
    Milliliters,
}

impl MeasurementUnit {
    pub fn code(self) -> &'static str {
        match self {
            MeasurementUnit::Grams => "g",
            MeasurementUnit::Pieces => "szt",
            MeasurementUnit::Milliliters => "ml",
        }
    }
}

impl FromStr for MeasurementUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" | "grams" => Ok(MeasurementUnit::Grams),
            "szt" | "pcs" | "pieces" => Ok(MeasurementUnit::Pieces),
            "ml" | "milliliters" => Ok(MeasurementUnit::Milliliters),
            other => Err(format!("unknown measurement unit '{other}'")),
        }
    }
}

impl TryFrom<String> for MeasurementUnit {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MeasurementUnit> for String {
    fn from(u: MeasurementUnit) -> Self {
        u.code().to_string()
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderStatus {
    New,
    Pending,
    Completed,
    Cancelled,
    AiPending,
    AiCompleted,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::AiPending => "aipending",
            OrderStatus::AiCompleted => "aicompleted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::AiCompleted | OrderStatus::Cancelled
        )
    }

    /// Staying in the same status is always allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if self == next {
            return true;
        }
        match (self, next) {
            (_, Cancelled) => !self.is_terminal(),
            (New, Pending) => true,
            (Pending, AiPending | Completed) => true,
            (AiPending, AiCompleted | Completed) => true,
            _ => false,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(OrderStatus::New),
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "aipending" => Ok(OrderStatus::AiPending),
            "aicompleted" => Ok(OrderStatus::AiCompleted),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<OrderStatus> for String {
    fn from(s: OrderStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meal slot within a day. Slots outside the known five are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    AfternoonSnack,
    EveningSnack,
    Other(String),
}

impl MealType {
    pub fn as_str(&self) -> &str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::AfternoonSnack => "afternoon_snack",
            MealType::EveningSnack => "evening_snack",
            MealType::Other(raw) => raw,
        }
    }
}

impl From<String> for MealType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "afternoon_snack" => MealType::AfternoonSnack,
            "evening_snack" => MealType::EveningSnack,
            _ => MealType::Other(s),
        }
    }
}

impl From<&str> for MealType {
    fn from(s: &str) -> Self {
        MealType::from(s.to_string())
    }
}

impl From<MealType> for String {
    fn from(t: MealType) -> Self {
        match t {
            MealType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    Other(String),
}

impl From<String> for Gender {
    fn from(s: String) -> Self {
        match s.as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Other(s),
        }
    }
}

impl From<Gender> for String {
    fn from(g: Gender) -> Self {
        match g {
            Gender::Male => "male".into(),
            Gender::Female => "female".into(),
            Gender::Other(raw) => raw,
        }
    }
}

/// Activity category. Anything unrecognised lands in the top bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityLevel {
    Low,
    Medium,
    High,
    Other(String),
}

impl From<String> for ActivityLevel {
    fn from(s: String) -> Self {
        match s.as_str() {
            "low" => ActivityLevel::Low,
            "medium" => ActivityLevel::Medium,
            "high" => ActivityLevel::High,
            _ => ActivityLevel::Other(s),
        }
    }
}

impl From<ActivityLevel> for String {
    fn from(a: ActivityLevel) -> Self {
        match a {
            ActivityLevel::Low => "low".into(),
            ActivityLevel::Medium => "medium".into(),
            ActivityLevel::High => "high".into(),
            ActivityLevel::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Allergen {
    Gluten,
    Lactose,
    Nuts,
    Fish,
    Soy,
}

impl Allergen {
    /// Name understood by the plan generator.
    pub fn domain_name(self) -> &'static str {
        match self {
            Allergen::Gluten => "gluten",
            Allergen::Lactose => "laktoza",
            Allergen::Nuts => "orzechy",
            Allergen::Fish => "ryby",
            Allergen::Soy => "soja",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diet {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub preparation_time: i32,
    pub calories: i32,
    pub calories_per_100g: i32,
    pub default_grams: i32,
    pub protein: i32,
    pub fats: i32,
    pub carbohydrates: i32,
    pub image_url: Option<String>,
    pub lactose: bool,
    pub nut: bool,
    pub soy: bool,
    pub gluten: bool,
    pub fish: bool,
}

#[cfg(test)]
impl Meal {
    /// Row created when a plan references a meal id the catalog does not know.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryRestrictions {
    pub gluten_free: bool,
    pub lactose_free: bool,
    pub nut_free: bool,
    pub fish_free: bool,
    pub soy_free: bool,
}

impl DietaryRestrictions {
    pub fn allergens(&self) -> Vec<Allergen> {
        [
            (self.gluten_free, Allergen::Gluten),
            (self.lactose_free, Allergen::Lactose),
            (self.nut_free, Allergen::Nuts),
            (self.fish_free, Allergen::Fish),
            (self.soy_free, Allergen::Soy),
        ]
        .into_iter()
        .filter_map(|(on, allergen)| on.then_some(allergen))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricProfile {
    pub gender: Gender,
    pub age: i32,
    pub weight: f64,
    pub height: i32,
    pub activity_level: ActivityLevel,
}

impl Default for BiometricProfile {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            age: 0,
            weight: 0.0,
            height: 0,
            activity_level: ActivityLevel::Medium,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DietSubscription {
    pub id: i64,
    pub user_id: Uuid,
    pub diet_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ends_at: Option<OffsetDateTime>,
    pub diet_type: String,
    pub meal_count: i32,
    #[serde(flatten)]
    pub restrictions: DietaryRestrictions,
    pub food_preferences: BTreeMap<String, i64>,
    #[serde(flatten)]
    pub profile: BiometricProfile,
    pub preferences_set: bool,
}

impl DietSubscription {
    pub fn dishes_scored(&self, value: i64) -> Vec<String> {
        self.food_preferences
            .iter()
            .filter(|(_, s)| **s == value)
            .map(|(dish, _)| dish.clone())
            .collect()
    }
}

/// Values for a subscription that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub diet_id: i64,
    pub starts_at: OffsetDateTime,
    pub ends_at: Option<OffsetDateTime>,
    pub diet_type: String,
    pub meal_count: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: Uuid,
    pub diet_id: Option<i64>,
    pub subscription_id: Option<i64>,
    pub duration: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DietDay {
    pub id: i64,
    pub subscription_id: i64,
    #[serde(with = "iso_date")]
    pub date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DietMeal {
    pub uuid: Uuid,
    pub day_id: i64,
    pub meal_id: i64,
    pub meal_type: MealType,
    pub quantity: i32,
    pub unit: MeasurementUnit,
}

/// A scheduled meal joined with its catalog entry.
#[derive(Debug, Clone)]
pub struct PlannedMeal {
    pub entry: DietMeal,
    pub meal: Meal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn unit_codes_parse_and_print() {
        assert_eq!("g".parse::<MeasurementUnit>(), Ok(MeasurementUnit::Grams));
        assert_eq!("szt".parse::<MeasurementUnit>(), Ok(MeasurementUnit::Pieces));
        assert_eq!("pcs".parse::<MeasurementUnit>(), Ok(MeasurementUnit::Pieces));
        assert_eq!("ml".parse::<MeasurementUnit>(), Ok(MeasurementUnit::Milliliters));
        assert!("kg".parse::<MeasurementUnit>().is_err());
        assert_eq!(MeasurementUnit::Pieces.to_string(), "szt");
    }

    #[test]
    fn order_status_is_case_insensitive() {
        assert_eq!("Pending".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
        assert_eq!("AIPENDING".parse::<OrderStatus>(), Ok(OrderStatus::AiPending));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_transitions() {
        use OrderStatus::*;
        assert!(New.can_transition_to(Pending));
        assert!(Pending.can_transition_to(AiPending));
        assert!(AiPending.can_transition_to(Completed));
        assert!(AiPending.can_transition_to(AiCompleted));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!New.can_transition_to(Completed));
    }

    #[test]
    fn meal_type_keeps_unknown_slots() {
        assert_eq!(MealType::from("lunch"), MealType::Lunch);
        let brunch = MealType::from("brunch");
        assert_eq!(brunch, MealType::Other("brunch".into()));
        assert_eq!(String::from(brunch), "brunch");
    }

    #[test]
    fn restrictions_map_to_domain_names() {
        let r = DietaryRestrictions {
            gluten_free: true,
            fish_free: true,
            ..Default::default()
        };
        let names: Vec<_> = r.allergens().into_iter().map(Allergen::domain_name).collect();
        assert_eq!(names, vec!["gluten", "ryby"]);
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_iso_date("2024-03-05").unwrap(), date!(2024 - 03 - 05));
        assert!(parse_iso_date("05/03/2024").is_err());
        assert!(parse_iso_date("2024-13-01").is_err());
    }
}
