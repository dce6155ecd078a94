use tracing::{info, instrument};
use uuid::Uuid;

use crate::diet::services::parse_date;
use crate::error::AppError;
use crate::measurements::dto::{MeasurementRequest, MeasurementValues};
use crate::measurements::repo_types::BodyMeasurement;
use crate::state::AppState;

pub fn validate(req: MeasurementRequest) -> Result<MeasurementValues, AppError> {
    let date = parse_date(req.date.as_deref(), "date")?;
    for (name, value) in [
        ("waist", req.waist),
        ("chest", req.chest),
        ("bicep", req.bicep),
        ("thigh", req.thigh),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(AppError::validation(format!("{name} must be a positive number")));
            }
        }
    }
    Ok(MeasurementValues {
        date,
        waist: req.waist,
        chest: req.chest,
        bicep: req.bicep,
        thigh: req.thigh,
    })
}

const DATE_TAKEN: &str = "A measurement for this date already exists.";

/// `UNIQUE (user_id, date)` losing a race surfaces as the same 400 as the
/// pre-check.
fn date_taken(e: sqlx::Error) -> AppError {
    let unique_violation = e
        .as_database_error()
        .is_some_and(|db| db.code().as_deref() == Some("23505"));
    if unique_violation {
        AppError::validation(DATE_TAKEN)
    } else {
        e.into()
    }
}

/// One measurement per user and day.
#[instrument(skip(st, req))]
pub async fn create(
    st: &AppState,
    user_id: Uuid,
    req: MeasurementRequest,
) -> Result<BodyMeasurement, AppError> {
    let values = validate(req)?;
    if BodyMeasurement::id_on(&st.db, user_id, values.date).await?.is_some() {
        return Err(AppError::validation(DATE_TAKEN));
    }
    let m = BodyMeasurement::create(&st.db, user_id, &values)
        .await
        .map_err(date_taken)?;
    info!(measurement_id = m.id, date = %m.date, "measurement recorded");
    Ok(m)
}

#[instrument(skip(st, req))]
pub async fn update(
    st: &AppState,
    user_id: Uuid,
    id: i64,
    req: MeasurementRequest,
) -> Result<BodyMeasurement, AppError> {
    let values = validate(req)?;
    if let Some(other) = BodyMeasurement::id_on(&st.db, user_id, values.date).await? {
        if other != id {
            return Err(AppError::validation(DATE_TAKEN));
        }
    }
    BodyMeasurement::update_owned(&st.db, user_id, id, &values)
        .await
        .map_err(date_taken)?
        .ok_or_else(|| AppError::not_found(format!("measurement {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn req(date: Option<&str>, waist: Option<f64>) -> MeasurementRequest {
        MeasurementRequest {
            date: date.map(str::to_string),
            waist,
            chest: Some(101.5),
            bicep: None,
            thigh: None,
        }
    }

    #[test]
    fn accepts_partial_measurements() {
        let v = validate(req(Some("2024-04-10"), Some(82.0))).unwrap();
        assert_eq!(v.date, date!(2024 - 04 - 10));
        assert_eq!(v.waist, Some(82.0));
        assert_eq!(v.bicep, None);
    }

    #[test]
    fn rejects_negative_or_missing_date() {
        assert!(matches!(
            validate(req(Some("2024-04-10"), Some(-1.0))),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(validate(req(None, None)), Err(AppError::Validation(_))));
    }

    #[derive(Debug)]
    struct PgError(&'static str);

    impl std::fmt::Display for PgError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "pg error {}", self.0)
        }
    }

    impl std::error::Error for PgError {}

    impl sqlx::error::DatabaseError for PgError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(self.0.into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    #[test]
    fn lost_insert_race_is_a_validation_error() {
        let err = date_taken(sqlx::Error::Database(Box::new(PgError("23505"))));
        assert!(matches!(&err, AppError::Validation(m) if m == DATE_TAKEN));

        let other = date_taken(sqlx::Error::Database(Box::new(PgError("23503"))));
        assert_eq!(other.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(date_taken(sqlx::Error::RowNotFound), AppError::Store(_)));
    }

    #[test]
    fn serializes_without_owner() {
        let m = BodyMeasurement {
            id: 4,
            user_id: Uuid::new_v4(),
            date: date!(2024 - 04 - 10),
            waist: Some(80.5),
            chest: None,
            bicep: None,
            thigh: None,
        };
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["date"], "2024-04-10");
        assert!(json.get("user_id").is_none());
    }
}
