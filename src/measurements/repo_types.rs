use serde::Serialize;
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

use crate::diet::model::iso_date;

/// Body circumferences taken on one day, in centimetres.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct BodyMeasurement {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub waist: Option<f64>,
    pub chest: Option<f64>,
    pub bicep: Option<f64>,
    pub thigh: Option<f64>,
}
