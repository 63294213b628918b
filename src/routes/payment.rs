use axum::{Json, Router, extract::State, http::StatusCode, routing::post};

use crate::{
    dto::payment::{CreatePaymentOrderRequest, PaymentOrderResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/payment/create-order", post(create_payment_order))
}

#[utoipa::path(
    post,
    path = "/api/payment/create-order",
    request_body = CreatePaymentOrderRequest,
    responses(
        (status = 201, description = "Gateway order and publishable key", body = ApiResponse<PaymentOrderResponse>),
        (status = 400, description = "Invalid amount"),
        (status = 500, description = "Failed to create payment order")
    ),
    tag = "Payment"
)]
pub async fn create_payment_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PaymentOrderResponse>>)> {
    let resp = payment_service::create_payment_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
