use std::collections::HashMap;

use anyhow::Context;
use time::{Date, Duration, OffsetDateTime, Time};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::measurements::repo_types::BodyMeasurement;
use crate::state::AppState;
use crate::training::dto::{
    ExerciseInput, ExerciseView, NewTrainingRequest, SeriesView, TrainingView, UserProgress,
};
use crate::training::repo_types::{CatalogExercise, Exercise, ExerciseSeries, TrainingSession};

const RECENT_TRAININGS: i64 = 3;
pub const CATALOG_LIMIT: i64 = 50;

/// `%query%` for `ILIKE ... ESCAPE '\'`, with wildcards in `query` taken literally.
pub fn contains_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Catalog exercises whose name contains `query`, ignoring case.
#[instrument(skip(st))]
pub async fn search_catalog(st: &AppState, query: &str) -> Result<Vec<CatalogExercise>, AppError> {
    Ok(CatalogExercise::search(&st.db, &contains_pattern(query), CATALOG_LIMIT).await?)
}

/// Monday 00:00 of `today`'s week and the Monday after, in UTC.
pub fn week_bounds(today: Date) -> (OffsetDateTime, OffsetDateTime) {
    let monday = today - Duration::days(i64::from(today.weekday().number_days_from_monday()));
    let start = monday.with_time(Time::MIDNIGHT).assume_utc();
    (start, start + Duration::days(7))
}

pub fn validate_exercise(ex: &ExerciseInput) -> Result<(), AppError> {
    if ex.name.trim().is_empty() {
        return Err(AppError::validation("exercise name is required"));
    }
    if ex
        .series
        .iter()
        .any(|s| s.repetitions < 0 || s.weight < 0.0 || !s.weight.is_finite())
    {
        return Err(AppError::validation(format!(
            "series of '{}' must have non-negative weight and repetitions",
            ex.name
        )));
    }
    Ok(())
}

/// Nests exercises and series under their sessions, keeping session order.
pub fn assemble(
    sessions: Vec<TrainingSession>,
    exercises: Vec<Exercise>,
    series: Vec<ExerciseSeries>,
) -> Vec<TrainingView> {
    let mut sets: HashMap<i64, Vec<SeriesView>> = HashMap::new();
    for s in series {
        sets.entry(s.exercise_id).or_default().push(SeriesView {
            id: s.id,
            weight: s.weight,
            repetitions: s.repetitions,
        });
    }
    let mut by_session: HashMap<i64, Vec<ExerciseView>> = HashMap::new();
    for e in exercises {
        by_session
            .entry(e.training_session_id)
            .or_default()
            .push(ExerciseView {
                id: e.id,
                series: sets.remove(&e.id).unwrap_or_default(),
                name: e.name,
            });
    }
    sessions
        .into_iter()
        .map(|t| TrainingView {
            exercises: by_session.remove(&t.id).unwrap_or_default(),
            id: t.id,
            date: t.date,
            notes: t.notes,
        })
        .collect()
}

async fn load_nested(
    st: &AppState,
    sessions: Vec<TrainingSession>,
) -> Result<Vec<TrainingView>, AppError> {
    let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    let exercises = Exercise::for_sessions(&st.db, &ids).await?;
    let ex_ids: Vec<i64> = exercises.iter().map(|e| e.id).collect();
    let series = ExerciseSeries::for_exercises(&st.db, &ex_ids).await?;
    Ok(assemble(sessions, exercises, series))
}

async fn insert_exercises(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    session_id: i64,
    inputs: &[ExerciseInput],
) -> anyhow::Result<(Vec<Exercise>, Vec<ExerciseSeries>)> {
    let mut exercises = Vec::with_capacity(inputs.len());
    let mut series = Vec::new();
    for input in inputs {
        let ex = Exercise::insert_tx(tx, session_id, input.name.trim())
            .await
            .with_context(|| format!("insert exercise {}", input.name))?;
        for s in &input.series {
            series.push(
                ExerciseSeries::insert_tx(tx, ex.id, s.weight, s.repetitions)
                    .await
                    .context("insert series")?,
            );
        }
        exercises.push(ex);
    }
    Ok((exercises, series))
}

/// Creates a session with its exercises in one transaction.
#[instrument(skip(st, req))]
pub async fn create_session(
    st: &AppState,
    user_id: Uuid,
    req: NewTrainingRequest,
) -> Result<TrainingView, AppError> {
    for ex in &req.exercises {
        validate_exercise(ex)?;
    }
    let date = req.date.unwrap_or_else(OffsetDateTime::now_utc);

    let mut tx = st.db.begin().await.context("begin tx")?;
    let session = TrainingSession::insert_tx(&mut tx, user_id, date, &req.notes)
        .await
        .context("insert training session")?;
    let (exercises, series) = insert_exercises(&mut tx, session.id, &req.exercises).await?;
    tx.commit().await.context("commit tx")?;

    info!(session_id = session.id, exercises = exercises.len(), "training session created");
    Ok(assemble(vec![session], exercises, series).remove(0))
}

/// Empty session dated now.
pub async fn start_session(st: &AppState, user_id: Uuid) -> Result<TrainingView, AppError> {
    create_session(
        st,
        user_id,
        NewTrainingRequest {
            date: None,
            notes: String::new(),
            exercises: Vec::new(),
        },
    )
    .await
}

#[instrument(skip(st, input))]
pub async fn add_exercise(
    st: &AppState,
    user_id: Uuid,
    session_id: i64,
    input: ExerciseInput,
) -> Result<ExerciseView, AppError> {
    validate_exercise(&input)?;
    TrainingSession::find_owned(&st.db, user_id, session_id)
        .await?
        .ok_or_else(|| AppError::not_found("Training session not found"))?;

    let mut tx = st.db.begin().await.context("begin tx")?;
    let (mut exercises, series) =
        insert_exercises(&mut tx, session_id, std::slice::from_ref(&input)).await?;
    tx.commit().await.context("commit tx")?;

    let ex = exercises.remove(0);
    Ok(ExerciseView {
        id: ex.id,
        name: ex.name,
        series: series
            .into_iter()
            .map(|s| SeriesView {
                id: s.id,
                weight: s.weight,
                repetitions: s.repetitions,
            })
            .collect(),
    })
}

pub async fn list_sessions(st: &AppState, user_id: Uuid) -> Result<Vec<TrainingView>, AppError> {
    let sessions = TrainingSession::list_for_user(&st.db, user_id).await?;
    load_nested(st, sessions).await
}

#[instrument(skip(st))]
pub async fn progress(st: &AppState, user_id: Uuid, today: Date) -> Result<UserProgress, AppError> {
    let (from, until) = week_bounds(today);
    let num_trainings_this_week =
        TrainingSession::count_between(&st.db, user_id, from, until).await?;
    let recent = TrainingSession::recent_for_user(&st.db, user_id, RECENT_TRAININGS).await?;
    Ok(UserProgress {
        num_trainings_this_week,
        last_three_trainings: load_nested(st, recent).await?,
        total_trainings: TrainingSession::count_for_user(&st.db, user_id).await?,
        body_measurements: BodyMeasurement::list_for_user(&st.db, user_id).await?,
    })
}
