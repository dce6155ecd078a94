use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::diet::model::{
    Diet, DietDay, DietMeal, DietSubscription, Meal, MeasurementUnit, NewSubscription, Order,
    OrderStatus, PlannedMeal,
};

pub mod locks;
#[cfg(test)]
pub mod memory;
pub mod pg;

pub use locks::SubscriptionLocks;
#[cfg(test)]
pub use memory::MemoryStore;
pub use pg::PgDietStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One meal-ingredient link reached through a scheduled meal.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientUsage {
    pub ingredient_name: String,
    pub unit: MeasurementUnit,
    /// `MealIngredient.quantity`, per 100-unit serving.
    pub base_quantity: f64,
    /// `DietMeal.quantity` of the scheduled meal.
    pub meal_quantity: i32,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub diet_id: i64,
    pub duration: i32,
    pub starts_at: OffsetDateTime,
    pub ends_at: OffsetDateTime,
    pub status: OrderStatus,
}

/// Persistence used by the diet engine.
#[async_trait]
pub trait DietStore: Send + Sync {
    // --- catalog ---
    async fn get_diet(&self, id: i64) -> StoreResult<Option<Diet>>;
    async fn get_meal(&self, id: i64) -> StoreResult<Option<Meal>>;
    /// Looks up a meal, creating an empty placeholder when the id is unknown.
    async fn ensure_meal(&self, id: i64) -> StoreResult<Meal>;
    async fn find_meal_by_name(&self, name: &str) -> StoreResult<Option<Meal>>;
    async fn search_meals(&self, query: &str, limit: i64) -> StoreResult<Vec<Meal>>;

    // --- orders ---
    /// Creates the order together with its subscription over the same range.
    async fn create_order(&self, new: NewOrder) -> StoreResult<(Order, DietSubscription)>;
    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>>;
    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;
    async fn latest_order_for_user(&self, user_id: Uuid) -> StoreResult<Option<Order>>;
    async fn order_for_subscription(&self, subscription_id: i64) -> StoreResult<Option<Order>>;
    async fn set_order_status(&self, order_id: i64, status: OrderStatus) -> StoreResult<()>;

    // --- subscriptions ---
    async fn get_subscription(&self, id: i64) -> StoreResult<Option<DietSubscription>>;
    async fn latest_subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Option<DietSubscription>>;
    /// Returns the subscription and whether it was created by this call.
    async fn find_or_create_subscription(
        &self,
        new: NewSubscription,
    ) -> StoreResult<(DietSubscription, bool)>;
    async fn save_subscription(&self, subscription: &DietSubscription) -> StoreResult<()>;

    // --- days and scheduled meals ---
    async fn find_or_create_day(&self, subscription_id: i64, date: Date) -> StoreResult<DietDay>;
    async fn create_days(&self, subscription_id: i64, dates: &[Date]) -> StoreResult<()>;
    async fn days_in_range(
        &self,
        subscription_id: i64,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<DietDay>>;
    async fn day_meals(&self, day_id: i64) -> StoreResult<Vec<PlannedMeal>>;
    /// Insert or update keyed by `meal.uuid`. An existing row is only
    /// updated while it stays within the subscription of `meal.day_id`;
    /// otherwise the call fails with `NotFound`.
    async fn upsert_diet_meal(&self, meal: &DietMeal) -> StoreResult<()>;
    /// The subset of `uuids` stored under a subscription other than
    /// `subscription_id`.
    async fn foreign_diet_meals(
        &self,
        subscription_id: i64,
        uuids: &[Uuid],
    ) -> StoreResult<Vec<Uuid>>;
    async fn delete_diet_meals(&self, day_id: i64, uuids: &[Uuid]) -> StoreResult<u64>;

    // --- aggregation ---
    /// Ingredient links for every meal scheduled in `[start, end]` under the
    /// user's subscriptions overlapping that range.
    async fn ingredient_usage(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<IngredientUsage>>;
}
