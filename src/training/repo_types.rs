use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct TrainingSession {
    pub id: i64,
    pub user_id: Uuid,
    pub date: OffsetDateTime,
    pub notes: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Exercise {
    pub id: i64,
    pub training_session_id: i64,
    pub name: String,
}

/// One set: weight in kilograms times repetitions.
#[derive(Debug, Clone, FromRow)]
pub struct ExerciseSeries {
    pub id: i64,
    pub exercise_id: i64,
    pub weight: f64,
    pub repetitions: i32,
}

/// Reference exercise users pick names from.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CatalogExercise {
    pub id: i64,
    pub name: String,
    pub description: String,
}
