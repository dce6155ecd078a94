use serde::{Deserialize, Serialize};

/// Body of `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub dieta_id: Option<i64>,
    /// Months.
    pub duration: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub message: &'static str,
    pub zamowienie_id: i64,
}
