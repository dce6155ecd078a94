use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::training::repo_types::{CatalogExercise, Exercise, ExerciseSeries, TrainingSession};

impl TrainingSession {
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        date: OffsetDateTime,
        notes: &str,
    ) -> sqlx::Result<TrainingSession> {
        sqlx::query_as::<_, TrainingSession>(
            r#"
            INSERT INTO training_sessions (user_id, date, notes)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, date, notes
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(notes)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn find_owned(
        db: &PgPool,
        user_id: Uuid,
        id: i64,
    ) -> sqlx::Result<Option<TrainingSession>> {
        sqlx::query_as::<_, TrainingSession>(
            r#"SELECT id, user_id, date, notes FROM training_sessions WHERE id = $1 AND user_id = $2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Oldest first.
    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<TrainingSession>> {
        sqlx::query_as::<_, TrainingSession>(
            r#"
            SELECT id, user_id, date, notes
            FROM training_sessions
            WHERE user_id = $1
            ORDER BY date, id
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Newest first.
    pub async fn recent_for_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> sqlx::Result<Vec<TrainingSession>> {
        sqlx::query_as::<_, TrainingSession>(
            r#"
            SELECT id, user_id, date, notes
            FROM training_sessions
            WHERE user_id = $1
            ORDER BY date DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(db)
        .await
    }

    pub async fn count_for_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM training_sessions WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_one(db)
            .await
    }

    /// Sessions with `from <= date < until`.
    pub async fn count_between(
        db: &PgPool,
        user_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM training_sessions
            WHERE user_id = $1 AND date >= $2 AND date < $3
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(until)
        .fetch_one(db)
        .await
    }
}

impl Exercise {
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        session_id: i64,
        name: &str,
    ) -> sqlx::Result<Exercise> {
        sqlx::query_as::<_, Exercise>(
            r#"
            INSERT INTO exercises (training_session_id, name)
            VALUES ($1, $2)
            RETURNING id, training_session_id, name
            "#,
        )
        .bind(session_id)
        .bind(name)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn for_sessions(db: &PgPool, session_ids: &[i64]) -> sqlx::Result<Vec<Exercise>> {
        sqlx::query_as::<_, Exercise>(
            r#"
            SELECT id, training_session_id, name
            FROM exercises
            WHERE training_session_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(session_ids)
        .fetch_all(db)
        .await
    }
}

impl ExerciseSeries {
    pub async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        exercise_id: i64,
        weight: f64,
        repetitions: i32,
    ) -> sqlx::Result<ExerciseSeries> {
        sqlx::query_as::<_, ExerciseSeries>(
            r#"
            INSERT INTO exercise_series (exercise_id, weight, repetitions)
            VALUES ($1, $2, $3)
            RETURNING id, exercise_id, weight, repetitions
            "#,
        )
        .bind(exercise_id)
        .bind(weight)
        .bind(repetitions)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn for_exercises(
        db: &PgPool,
        exercise_ids: &[i64],
    ) -> sqlx::Result<Vec<ExerciseSeries>> {
        sqlx::query_as::<_, ExerciseSeries>(
            r#"
            SELECT id, exercise_id, weight, repetitions
            FROM exercise_series
            WHERE exercise_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(exercise_ids)
        .fetch_all(db)
        .await
    }
}

impl CatalogExercise {
    /// `pattern` is an `ILIKE` pattern with `\` as the escape character.
    pub async fn search(db: &PgPool, pattern: &str, limit: i64) -> sqlx::Result<Vec<CatalogExercise>> {
        sqlx::query_as::<_, CatalogExercise>(
            r#"
            SELECT id, name, description
            FROM exercises_catalog
            WHERE name ILIKE $1 ESCAPE '\'
            ORDER BY name
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(db)
        .await
    }
}
