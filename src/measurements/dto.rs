use serde::Deserialize;
use time::Date;

/// Body of `POST /measurements` and `PUT /measurements/:id`.
#[derive(Debug, Deserialize)]
pub struct MeasurementRequest {
    pub date: Option<String>,
    pub waist: Option<f64>,
    pub chest: Option<f64>,
    pub bicep: Option<f64>,
    pub thigh: Option<f64>,
}

/// Checked values ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementValues {
    pub date: Date,
    pub waist: Option<f64>,
    pub chest: Option<f64>,
    pub bicep: Option<f64>,
    pub thigh: Option<f64>,
}
