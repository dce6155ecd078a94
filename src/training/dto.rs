use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::measurements::repo_types::BodyMeasurement;

/// Query of `GET /exercises`.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Deserialize)]
pub struct SeriesInput {
    pub weight: f64,
    pub repetitions: i32,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseInput {
    pub name: String,
    #[serde(default)]
    pub series: Vec<SeriesInput>,
}

/// Body of `POST /training-sessions`.
#[derive(Debug, Deserialize)]
pub struct NewTrainingRequest {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub exercises: Vec<ExerciseInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub id: i64,
    pub weight: f64,
    pub repetitions: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseView {
    pub id: i64,
    pub name: String,
    pub series: Vec<SeriesView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingView {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub notes: String,
    pub exercises: Vec<ExerciseView>,
}

#[derive(Debug, Serialize)]
pub struct UserProgress {
    pub num_trainings_this_week: i64,
    pub last_three_trainings: Vec<TrainingView>,
    pub total_trainings: i64,
    pub body_measurements: Vec<BodyMeasurement>,
}
