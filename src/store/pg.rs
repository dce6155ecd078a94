use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::{DietStore, IngredientUsage, NewOrder, StoreError, StoreResult};
use crate::diet::model::{
    BiometricProfile, Diet, DietDay, DietMeal, DietSubscription, DietaryRestrictions, Meal,
    NewSubscription, Order, OrderStatus, PlannedMeal,
};

const MEAL_COLUMNS: &str = r#"
    id, name, short_description, long_description, preparation_time, calories,
    calories_per_100g, default_grams, protein, fats, carbohydrates, image_url,
    lactose, nut, soy, gluten, fish
"#;

const SUBSCRIPTION_COLUMNS: &str = r#"
    id, user_id, diet_id, starts_at, ends_at, diet_type, meal_count,
    gluten_free, lactose_free, nut_free, fish_free, soy_free, food_preferences,
    gender, age, weight, height, activity_level, preferences_set
"#;

const ORDER_COLUMNS: &str =
    "id, user_id, diet_id, user_diet_id, duration, starts_at, ends_at, status";

#[derive(Debug, FromRow)]
struct DietRow {
    id: i64,
    name: String,
    description: String,
    price: f64,
}

#[derive(Debug, FromRow)]
struct MealRow {
    id: i64,
    name: String,
    short_description: String,
    long_description: String,
    preparation_time: i32,
    calories: i32,
    calories_per_100g: i32,
    default_grams: i32,
    protein: i32,
    fats: i32,
    carbohydrates: i32,
    image_url: Option<String>,
    lactose: bool,
    nut: bool,
    soy: bool,
    gluten: bool,
    fish: bool,
}

impl From<MealRow> for Meal {
    fn from(r: MealRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            short_description: r.short_description,
            long_description: r.long_description,
            preparation_time: r.preparation_time,
            calories: r.calories,
            calories_per_100g: r.calories_per_100g,
            default_grams: r.default_grams,
            protein: r.protein,
            fats: r.fats,
            carbohydrates: r.carbohydrates,
            image_url: r.image_url,
            lactose: r.lactose,
            nut: r.nut,
            soy: r.soy,
            gluten: r.gluten,
            fish: r.fish,
        }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRow {
    id: i64,
    user_id: Uuid,
    diet_id: i64,
    starts_at: OffsetDateTime,
    ends_at: Option<OffsetDateTime>,
    diet_type: String,
    meal_count: i32,
    gluten_free: bool,
    lactose_free: bool,
    nut_free: bool,
    fish_free: bool,
    soy_free: bool,
    food_preferences: Json<BTreeMap<String, i64>>,
    gender: String,
    age: i32,
    weight: f64,
    height: i32,
    activity_level: String,
    preferences_set: bool,
}

impl From<SubscriptionRow> for DietSubscription {
    fn from(r: SubscriptionRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            diet_id: r.diet_id,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            diet_type: r.diet_type,
            meal_count: r.meal_count,
            restrictions: DietaryRestrictions {
                gluten_free: r.gluten_free,
                lactose_free: r.lactose_free,
                nut_free: r.nut_free,
                fish_free: r.fish_free,
                soy_free: r.soy_free,
            },
            food_preferences: r.food_preferences.0,
            profile: BiometricProfile {
                gender: r.gender.into(),
                age: r.age,
                weight: r.weight,
                height: r.height,
                activity_level: r.activity_level.into(),
            },
            preferences_set: r.preferences_set,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    user_id: Uuid,
    diet_id: Option<i64>,
    user_diet_id: Option<i64>,
    duration: i32,
    starts_at: OffsetDateTime,
    ends_at: OffsetDateTime,
    status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            diet_id: r.diet_id,
            subscription_id: r.user_diet_id,
            duration: r.duration,
            starts_at: r.starts_at,
            ends_at: r.ends_at,
            status: r.status.parse().map_err(StoreError::Corrupt)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct DayRow {
    id: i64,
    user_diet_id: i64,
    date: Date,
}

impl From<DayRow> for DietDay {
    fn from(r: DayRow) -> Self {
        Self {
            id: r.id,
            subscription_id: r.user_diet_id,
            date: r.date,
        }
    }
}

#[derive(Debug, FromRow)]
struct PlannedMealRow {
    uuid: Uuid,
    diet_day_id: i64,
    meal_type: String,
    quantity: i32,
    unit: String,
    #[sqlx(flatten)]
    meal: MealRow,
}

impl TryFrom<PlannedMealRow> for PlannedMeal {
    type Error = StoreError;

    fn try_from(r: PlannedMealRow) -> Result<Self, Self::Error> {
        Ok(Self {
            entry: DietMeal {
                uuid: r.uuid,
                day_id: r.diet_day_id,
                meal_id: r.meal.id,
                meal_type: r.meal_type.into(),
                quantity: r.quantity,
                unit: r.unit.parse().map_err(StoreError::Corrupt)?,
            },
            meal: r.meal.into(),
        })
    }
}

#[derive(Debug, FromRow)]
struct UsageRow {
    name: String,
    measurement_unit: String,
    quantity: f64,
    meal_quantity: i32,
}

/// `DietStore` on PostgreSQL.
#[derive(Clone)]
pub struct PgDietStore {
    db: PgPool,
}

impl PgDietStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_subscription(&self, id: i64) -> StoreResult<Option<DietSubscription>> {
        let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM user_diets WHERE id = $1");
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl DietStore for PgDietStore {
    async fn get_diet(&self, id: i64) -> StoreResult<Option<Diet>> {
        let row = sqlx::query_as::<_, DietRow>(
            r#"SELECT id, name, description, price::float8 AS price FROM diets WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|r| Diet {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
        }))
    }

    async fn get_meal(&self, id: i64) -> StoreResult<Option<Meal>> {
        let sql = format!("SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1");
        let row = sqlx::query_as::<_, MealRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn ensure_meal(&self, id: i64) -> StoreResult<Meal> {
        sqlx::query(r#"INSERT INTO meals (id) VALUES ($1) ON CONFLICT (id) DO NOTHING"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        self.get_meal(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("meal {id}")))
    }

    async fn find_meal_by_name(&self, name: &str) -> StoreResult<Option<Meal>> {
        let sql = format!("SELECT {MEAL_COLUMNS} FROM meals WHERE name = $1 ORDER BY id LIMIT 1");
        let row = sqlx::query_as::<_, MealRow>(&sql)
            .bind(name)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn search_meals(&self, query: &str, limit: i64) -> StoreResult<Vec<Meal>> {
        let sql = format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE name ILIKE '%' || $1 || '%' ORDER BY id LIMIT $2"
        );
        let rows = sqlx::query_as::<_, MealRow>(&sql)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_order(&self, new: NewOrder) -> StoreResult<(Order, DietSubscription)> {
        let mut tx = self.db.begin().await?;

        let sql = format!(
            "INSERT INTO user_diets (user_id, diet_id, starts_at, ends_at) \
             VALUES ($1, $2, $3, $4) RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        let subscription: DietSubscription = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(new.user_id)
            .bind(new.diet_id)
            .bind(new.starts_at)
            .bind(new.ends_at)
            .fetch_one(&mut *tx)
            .await?
            .into();

        let sql = format!(
            "INSERT INTO orders (user_id, diet_id, user_diet_id, duration, starts_at, ends_at, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(new.user_id)
            .bind(new.diet_id)
            .bind(subscription.id)
            .bind(new.duration)
            .bind(new.starts_at)
            .bind(new.ends_at)
            .bind(new.status.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((order.try_into()?, subscription))
    }

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn latest_order_for_user(&self, user_id: Uuid) -> StoreResult<Option<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY starts_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn order_for_subscription(&self, subscription_id: i64) -> StoreResult<Option<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_diet_id = $1 ORDER BY id LIMIT 1"
        );
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(subscription_id)
            .fetch_optional(&self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn set_order_status(&self, order_id: i64, status: OrderStatus) -> StoreResult<()> {
        let done = sqlx::query(r#"UPDATE orders SET status = $2 WHERE id = $1"#)
            .bind(order_id)
            .bind(status.as_str())
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("order {order_id}")));
        }
        Ok(())
    }

    async fn get_subscription(&self, id: i64) -> StoreResult<Option<DietSubscription>> {
        self.fetch_subscription(id).await
    }

    async fn latest_subscription_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Option<DietSubscription>> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM user_diets WHERE user_id = $1 \
             ORDER BY starts_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_or_create_subscription(
        &self,
        new: NewSubscription,
    ) -> StoreResult<(DietSubscription, bool)> {
        let sql = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM user_diets WHERE user_id = $1 AND diet_id = $2 \
             ORDER BY id LIMIT 1"
        );
        if let Some(row) = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(new.user_id)
            .bind(new.diet_id)
            .fetch_optional(&self.db)
            .await?
        {
            return Ok((row.into(), false));
        }

        let sql = format!(
            "INSERT INTO user_diets (user_id, diet_id, starts_at, ends_at, diet_type, meal_count) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(new.user_id)
            .bind(new.diet_id)
            .bind(new.starts_at)
            .bind(new.ends_at)
            .bind(&new.diet_type)
            .bind(new.meal_count)
            .fetch_one(&self.db)
            .await?;
        Ok((row.into(), true))
    }

    async fn save_subscription(&self, s: &DietSubscription) -> StoreResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE user_diets SET
                diet_type = $2, meal_count = $3,
                gluten_free = $4, lactose_free = $5, nut_free = $6, fish_free = $7, soy_free = $8,
                food_preferences = $9, gender = $10, age = $11, weight = $12, height = $13,
                activity_level = $14, preferences_set = $15
            WHERE id = $1
            "#,
        )
        .bind(s.id)
        .bind(&s.diet_type)
        .bind(s.meal_count)
        .bind(s.restrictions.gluten_free)
        .bind(s.restrictions.lactose_free)
        .bind(s.restrictions.nut_free)
        .bind(s.restrictions.fish_free)
        .bind(s.restrictions.soy_free)
        .bind(Json(&s.food_preferences))
        .bind(String::from(s.profile.gender.clone()))
        .bind(s.profile.age)
        .bind(s.profile.weight)
        .bind(s.profile.height)
        .bind(String::from(s.profile.activity_level.clone()))
        .bind(s.preferences_set)
        .execute(&self.db)
        .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("subscription {}", s.id)));
        }
        Ok(())
    }

    async fn find_or_create_day(&self, subscription_id: i64, date: Date) -> StoreResult<DietDay> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, DayRow>(
            r#"
            INSERT INTO diet_days (user_diet_id, date)
            VALUES ($1, $2)
            ON CONFLICT (user_diet_id, date) DO UPDATE SET date = EXCLUDED.date
            RETURNING id, user_diet_id, date
            "#,
        )
        .bind(subscription_id)
        .bind(date)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn create_days(&self, subscription_id: i64, dates: &[Date]) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO diet_days (user_diet_id, date)
            SELECT $1, d FROM unnest($2::date[]) AS d
            ON CONFLICT (user_diet_id, date) DO NOTHING
            "#,
        )
        .bind(subscription_id)
        .bind(dates)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn days_in_range(
        &self,
        subscription_id: i64,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<DietDay>> {
        let rows = sqlx::query_as::<_, DayRow>(
            r#"
            SELECT id, user_diet_id, date
              FROM diet_days
             WHERE user_diet_id = $1 AND date BETWEEN $2 AND $3
             ORDER BY date, id
            "#,
        )
        .bind(subscription_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn day_meals(&self, day_id: i64) -> StoreResult<Vec<PlannedMeal>> {
        let rows = sqlx::query_as::<_, PlannedMealRow>(
            r#"
            SELECT dm.uuid, dm.diet_day_id, dm.meal_type, dm.quantity, dm.unit,
                   m.id, m.name, m.short_description, m.long_description, m.preparation_time,
                   m.calories, m.calories_per_100g, m.default_grams, m.protein, m.fats,
                   m.carbohydrates, m.image_url, m.lactose, m.nut, m.soy, m.gluten, m.fish
              FROM diet_meals dm
              JOIN meals m ON m.id = dm.meal_id
             WHERE dm.diet_day_id = $1
             ORDER BY dm.created_at, dm.uuid
            "#,
        )
        .bind(day_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert_diet_meal(&self, meal: &DietMeal) -> StoreResult<()> {
        let done = sqlx::query(
            r#"
            INSERT INTO diet_meals (uuid, diet_day_id, meal_id, meal_type, quantity, unit)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (uuid) DO UPDATE SET
                diet_day_id = EXCLUDED.diet_day_id,
                meal_id = EXCLUDED.meal_id,
                meal_type = EXCLUDED.meal_type,
                quantity = EXCLUDED.quantity,
                unit = EXCLUDED.unit
            WHERE diet_meals.diet_day_id IN (
                SELECT id FROM diet_days
                 WHERE user_diet_id = (SELECT user_diet_id FROM diet_days WHERE id = $2)
            )
            "#,
        )
        .bind(meal.uuid)
        .bind(meal.day_id)
        .bind(meal.meal_id)
        .bind(meal.meal_type.as_str())
        .bind(meal.quantity)
        .bind(meal.unit.code())
        .execute(&self.db)
        .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("diet meal {}", meal.uuid)));
        }
        Ok(())
    }

    async fn foreign_diet_meals(
        &self,
        subscription_id: i64,
        uuids: &[Uuid],
    ) -> StoreResult<Vec<Uuid>> {
        if uuids.is_empty() {
            return Ok(Vec::new());
        }
        let found = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT dm.uuid
              FROM diet_meals dm
              JOIN diet_days dd ON dd.id = dm.diet_day_id
             WHERE dm.uuid = ANY($2) AND dd.user_diet_id <> $1
            "#,
        )
        .bind(subscription_id)
        .bind(uuids)
        .fetch_all(&self.db)
        .await?;
        Ok(found)
    }

    async fn delete_diet_meals(&self, day_id: i64, uuids: &[Uuid]) -> StoreResult<u64> {
        if uuids.is_empty() {
            return Ok(0);
        }
        let done = sqlx::query(
            r#"DELETE FROM diet_meals WHERE diet_day_id = $1 AND uuid = ANY($2)"#,
        )
        .bind(day_id)
        .bind(uuids)
        .execute(&self.db)
        .await?;
        Ok(done.rows_affected())
    }

    async fn ingredient_usage(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> StoreResult<Vec<IngredientUsage>> {
        let rows = sqlx::query_as::<_, UsageRow>(
            r#"
            SELECT i.name, i.measurement_unit, mi.quantity::float8 AS quantity,
                   dm.quantity AS meal_quantity
              FROM user_diets ud
              JOIN diet_days dd ON dd.user_diet_id = ud.id
              JOIN diet_meals dm ON dm.diet_day_id = dd.id
              JOIN meal_ingredients mi ON mi.meal_id = dm.meal_id
              JOIN ingredients i ON i.id = mi.ingredient_id
             WHERE ud.user_id = $1
               AND ud.ends_at IS NOT NULL
               AND ud.starts_at::date <= $3
               AND ud.ends_at::date >= $2
               AND dd.date BETWEEN $2 AND $3
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(IngredientUsage {
                    ingredient_name: r.name,
                    unit: r.measurement_unit.parse().map_err(StoreError::Corrupt)?,
                    base_quantity: r.quantity,
                    meal_quantity: r.meal_quantity,
                })
            })
            .collect()
    }
}
