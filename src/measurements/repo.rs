use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use crate::measurements::dto::MeasurementValues;
use crate::measurements::repo_types::BodyMeasurement;

impl BodyMeasurement {
    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<BodyMeasurement>> {
        sqlx::query_as::<_, BodyMeasurement>(
            r#"
            SELECT id, user_id, date, waist, chest, bicep, thigh
            FROM body_measurements
            WHERE user_id = $1
            ORDER BY date
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn find_owned(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
    ) -> sqlx::Result<Option<BodyMeasurement>> {
        sqlx::query_as::<_, BodyMeasurement>(
            r#"
            SELECT id, user_id, date, waist, chest, bicep, thigh
            FROM body_measurements
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Id of the user's measurement on `date`, if any.
    pub async fn id_on(db: &PgPool, user_id: Uuid, date: Date) -> sqlx::Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT id FROM body_measurements WHERE user_id = $1 AND date = $2"#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        v: &MeasurementValues,
    ) -> sqlx::Result<BodyMeasurement> {
        sqlx::query_as::<_, BodyMeasurement>(
            r#"
            INSERT INTO body_measurements (user_id, date, waist, chest, bicep, thigh)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, date, waist, chest, bicep, thigh
            "#,
        )
        .bind(user_id)
        .bind(v.date)
        .bind(v.waist)
        .bind(v.chest)
        .bind(v.bicep)
        .bind(v.thigh)
        .fetch_one(db)
        .await
    }

    pub async fn update_owned(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
        v: &MeasurementValues,
    ) -> sqlx::Result<Option<BodyMeasurement>> {
        sqlx::query_as::<_, BodyMeasurement>(
            r#"
            UPDATE body_measurements
            SET date = $3, waist = $4, chest = $5, bicep = $6, thigh = $7
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, date, waist, chest, bicep, thigh
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(v.date)
        .bind(v.waist)
        .bind(v.chest)
        .bind(v.bicep)
        .bind(v.thigh)
        .fetch_optional(db)
        .await
    }

    pub async fn delete_owned(db: &PgPool, user_id: Uuid, id: i64) -> sqlx::Result<u64> {
        let res = sqlx::query(r#"DELETE FROM body_measurements WHERE id = $1 AND user_id = $2"#)
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected())
    }
}
