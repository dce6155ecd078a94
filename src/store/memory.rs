use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use time::Date;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DietStore, IngredientUsage, NewOrder, StoreError, StoreResult};
use crate::diet::model::{
    BiometricProfile, Diet, DietDay, DietMeal, DietSubscription, DietaryRestrictions, Meal,
    MeasurementUnit, NewSubscription, Order, OrderStatus, PlannedMeal,
};

#[derive(Debug, Clone)]
struct MealIngredientRow {
    meal_id: i64,
    name: String,
    unit: MeasurementUnit,
    quantity: f64,
}

#[derive(Default)]
struct Inner {
    seq: i64,
    diets: BTreeMap<i64, Diet>,
    meals: BTreeMap<i64, Meal>,
    meal_ingredients: Vec<MealIngredientRow>,
    orders: BTreeMap<i64, Order>,
    subscriptions: BTreeMap<i64, DietSubscription>,
    days: BTreeMap<i64, DietDay>,
    /// Insertion-ordered, keyed by uuid.
    diet_meals: Vec<DietMeal>,
    write_count: u64,
    fail_on_date: Option<Date>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.seq += 1;
        self.seq
    }
}

/// In-process store backing `AppState::fake()` and tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_diet(&self, id: i64, name: &str) {
        let mut inner = self.inner.lock().await;
        inner.seq = inner.seq.max(id);
        inner.diets.insert(
            id,
            Diet {
                id,
                name: name.to_string(),
                description: String::new(),
                price: 0.0,
            },
        );
    }

    pub async fn add_meal(&self, meal: Meal) {
        let mut inner = self.inner.lock().await;
        inner.seq = inner.seq.max(meal.id);
        inner.meals.insert(meal.id, meal);
    }

    pub async fn add_meal_ingredient(
        &self,
        meal_id: i64,
        name: &str,
        unit: MeasurementUnit,
        quantity: f64,
    ) {
        self.inner.lock().await.meal_ingredients.push(MealIngredientRow {
            meal_id,
            name: name.to_string(),
            unit,
            quantity,
        });
    }

    /// Makes `find_or_create_day` fail for `date`.
    pub async fn fail_on_date(&self, date: Date) {
        self.inner.lock().await.fail_on_date = Some(date);
    }

    /// Number of mutating calls that changed state.
    pub async fn write_count(&self) -> u64 {
        self.inner.lock().await.write_count
    }

    pub async fn all_days(&self, subscription_id: i64) -> Vec<DietDay> {
        self.inner
            .lock()
            .await
            .days
            .values()
            .filter(|d| d.subscription_id == subscription_id)
            .cloned()
            .collect()
    }

    pub async fn all_diet_meals(&self) -> Vec<DietMeal> {
        self.inner.lock().await.diet_meals.clone()
    }
}

#[async_trait]
impl DietStore for MemoryStore {
    async fn get_diet(&self, id: i64) -> StoreResult<Option<Diet>> {
        Ok(self.inner.lock().await.diets.get(&id).cloned())
    }

    async fn get_meal(&self, id: i64) -> StoreResult<Option<Meal>> {
        Ok(self.inner.lock().await.meals.get(&id).cloned())
    }

    async fn ensure_meal(&self, id: i64) -> StoreResult<Meal> {
        let mut inner = self.inner.lock().await;
        if let Some(meal) = inner.meals.get(&id) {
            return Ok(meal.clone());
        }
        inner.write_count += 1;
        let meal = Meal::placeholder(id);
        inner.meals.insert(id, meal.clone());
        Ok(meal)
    }

    async fn find_meal_by_name(&self, name: &str) -> StoreResult<Option<Meal>> {
        Ok(self
            .inner
            .lock()
            .await
            .meals
            .values()
            .find(|m| m.name == name)
            .cloned())
    }

    async fn search_meals(&self, query: &str, limit: i64) -> StoreResult<Vec<Meal>> {
        let needle = query.to_lowercase();
        Ok(self
            .inner
            .lock()
            .await
            .meals
            .values()
            .filter(|m| m.name.to_lowercase().contains(&needle))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn create_order(&self, new: NewOrder) -> StoreResult<(Order, DietSubscription)> {
        let mut inner = self.inner.lock().await;
        inner.write_count += 1;
        let subscription = DietSubscription {
            id: inner.next_id(),
            user_id: new.user_id,
            diet_id: new.diet_id,
            starts_at: new.starts_at,
            ends_at: Some(new.ends_at),
            diet_type: "standard".into(),
            meal_count: 3,
            restrictions: DietaryRestrictions::default(),
            food_preferences: BTreeMap::new(),
            profile: BiometricProfile::default(),
            preferences_set: false,
        };
        let order = Order {
            id: inner.next_id(),
            user_id: new.user_id,
            diet_id: Some(new.diet_id),
            subscription_id: Some(subscription.id),
            duration: new.duration,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            status: new.status,
        };
        inner.subscriptions.insert(subscription.id, subscription.clone());
        inner.orders.insert(order.id, order.clone());
        Ok((order, subscription))
    }

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        Ok(self.inner.lock().await.orders.get(&id).cloned())
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        Ok(self
            .inner
            .lock()
            .await
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn latest_order_for_user(&self, user_id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self
            .inner
            .lock()
            .await
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .max_by_key(|o| (o.starts_at, o.id))
            .cloned())
    }

    async fn order_for_subscription(&self, subscription_id: i64) -> StoreResult<Option<Order>> {
        Ok(self
            .inner
            .lock()
            .await
            .orders
            .values()
            .find(|o| o.subscription_id == Some(subscription_id))
            .cloned())
    }

    async fn set_order_status(&self, order_id: i64, status: OrderStatus) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| StoreError::NotFound(format!("order {order_id}")))?;
        order.status = status;
        inner.write_count += 1;
        Ok(())
    }

    async fn get_subscription(&self, id: i64) -> StoreResult<Option<DietSubscription>> {
        Ok(self.inner.lock().await.subscriptions.get(&id).cloned())
    }

    async fn latest_subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Option<DietSubscription>> {
        Ok(self
            .inner
            .lock()
            .await
            .subscriptions
            .values()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| (s.starts_at, s.id))
            .cloned())
    }

    async fn find_or_create_subscription(
        &self,
        new: NewSubscription,
    ) -> StoreResult<(DietSubscription, bool)> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .subscriptions
            .values()
            .find(|s| s.user_id == new.user_id && s.diet_id == new.diet_id)
        {
            return Ok((existing.clone(), false));
        }
        inner.write_count += 1;
        let subscription = DietSubscription {
            id: inner.next_id(),
            user_id: new.user_id,
            diet_id: new.diet_id,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            diet_type: new.diet_type,
            meal_count: new.meal_count,
            restrictions: DietaryRestrictions::default(),
            food_preferences: BTreeMap::new(),
            profile: BiometricProfile::default(),
            preferences_set: false,
        };
        inner.subscriptions.insert(subscription.id, subscription.clone());
        Ok((subscription, true))
    }

    async fn save_subscription(&self, subscription: &DietSubscription) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.subscriptions.contains_key(&subscription.id) {
            return Err(StoreError::NotFound(format!(
                "subscription {}",
                subscription.id
            )));
        }
        inner.write_count += 1;
        inner
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(())
    }

    async fn find_or_create_day(&self, subscription_id: i64, date: Date) -> StoreResult<DietDay> {
        let mut inner = self.inner.lock().await;
        if inner.fail_on_date == Some(date) {
            return Err(StoreError::Backend(format!("write rejected for {date}")));
        }
        if let Some(day) = inner
            .days
            .values()
            .find(|d| d.subscription_id == subscription_id && d.date == date)
        {
            return Ok(day.clone());
        }
        inner.write_count += 1;
        let day = DietDay {
            id: inner.next_id(),
            subscription_id,
            date,
        };
        inner.days.insert(day.id, day.clone());
        Ok(day)
    }

    async fn create_days(&self, subscription_id: i64, dates: &[Date]) -> StoreResult<()> {
        for date in dates {
            self.find_or_create_day(subscription_id, *date).await?;
        }
        Ok(())
    }

    async fn days_in_range(
        &self,
        subscription_id: i64,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<DietDay>> {
        let mut days: Vec<DietDay> = self
            .inner
            .lock()
            .await
            .days
            .values()
            .filter(|d| d.subscription_id == subscription_id && d.date >= start && d.date <= end)
            .cloned()
            .collect();
        days.sort_by_key(|d| (d.date, d.id));
        Ok(days)
    }

    async fn day_meals(&self, day_id: i64) -> StoreResult<Vec<PlannedMeal>> {
        let inner = self.inner.lock().await;
        inner
            .diet_meals
            .iter()
            .filter(|m| m.day_id == day_id)
            .map(|entry| {
                let meal = inner
                    .meals
                    .get(&entry.meal_id)
                    .cloned()
                    .ok_or_else(|| StoreError::Corrupt(format!("meal {}", entry.meal_id)))?;
                Ok(PlannedMeal {
                    entry: entry.clone(),
                    meal,
                })
            })
            .collect()
    }

    async fn upsert_diet_meal(&self, meal: &DietMeal) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.days.contains_key(&meal.day_id) {
            return Err(StoreError::NotFound(format!("diet day {}", meal.day_id)));
        }
        if !inner.meals.contains_key(&meal.meal_id) {
            return Err(StoreError::NotFound(format!("meal {}", meal.meal_id)));
        }
        let owner = |inner: &Inner, day_id: i64| inner.days.get(&day_id).map(|d| d.subscription_id);
        let target = owner(&*inner, meal.day_id);
        if let Some(existing) = inner.diet_meals.iter().find(|m| m.uuid == meal.uuid) {
            if owner(&*inner, existing.day_id) != target {
                return Err(StoreError::NotFound(format!("diet meal {}", meal.uuid)));
            }
        }
        match inner.diet_meals.iter_mut().find(|m| m.uuid == meal.uuid) {
            Some(existing) if existing == meal => return Ok(()),
            Some(existing) => *existing = meal.clone(),
            None => inner.diet_meals.push(meal.clone()),
        }
        inner.write_count += 1;
        Ok(())
    }

    async fn foreign_diet_meals(
        &self,
        subscription_id: i64,
        uuids: &[Uuid],
    ) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .diet_meals
            .iter()
            .filter(|m| uuids.contains(&m.uuid))
            .filter(|m| {
                inner
                    .days
                    .get(&m.day_id)
                    .is_some_and(|d| d.subscription_id != subscription_id)
            })
            .map(|m| m.uuid)
            .collect())
    }

    async fn delete_diet_meals(&self, day_id: i64, uuids: &[Uuid]) -> StoreResult<u64> {
        let doomed: HashSet<&Uuid> = uuids.iter().collect();
        let mut inner = self.inner.lock().await;
        let before = inner.diet_meals.len();
        inner
            .diet_meals
            .retain(|m| !(m.day_id == day_id && doomed.contains(&m.uuid)));
        let removed = (before - inner.diet_meals.len()) as u64;
        if removed > 0 {
            inner.write_count += 1;
        }
        Ok(removed)
    }

    async fn ingredient_usage(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<IngredientUsage>> {
        let inner = self.inner.lock().await;
        let subscriptions: HashSet<i64> = inner
            .subscriptions
            .values()
            .filter(|s| s.user_id == user_id)
            .filter(|s| match s.ends_at {
                Some(ends) => s.starts_at.date() <= end && ends.date() >= start,
                None => false,
            })
            .map(|s| s.id)
            .collect();
        let days: HashSet<i64> = inner
            .days
            .values()
            .filter(|d| subscriptions.contains(&d.subscription_id))
            .filter(|d| d.date >= start && d.date <= end)
            .map(|d| d.id)
            .collect();

        let mut rows = Vec::new();
        for entry in inner.diet_meals.iter().filter(|m| days.contains(&m.day_id)) {
            for link in inner
                .meal_ingredients
                .iter()
                .filter(|l| l.meal_id == entry.meal_id)
            {
                rows.push(IngredientUsage {
                    ingredient_name: link.name.clone(),
                    unit: link.unit,
                    base_quantity: link.quantity,
                    meal_quantity: entry.quantity,
                });
            }
        }
        Ok(rows)
    }
}
