use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentOrderRequest {
    /// Major currency units.
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentOrderResponse {
    /// Order object as returned by the gateway.
    #[schema(value_type = Object)]
    pub order: serde_json::Value,
    pub key: String,
}
