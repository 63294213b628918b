use serde_json::json;

use crate::{
    audit,
    dto::payment::{CreatePaymentOrderRequest, PaymentOrderResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    payment::{GatewayOrderRequest, PaymentError, new_receipt, to_minor_units},
    response::ApiResponse,
    state::AppState,
};

/// Opens a gateway order for `amount` major units. The amount is checked
/// before the gateway is touched.
pub async fn create_payment_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentOrderRequest,
) -> AppResult<ApiResponse<PaymentOrderResponse>> {
    let amount = to_minor_units(payload.amount)?;
    let gateway = state.payments.as_ref().ok_or(PaymentError::NotConfigured)?;

    let request = GatewayOrderRequest {
        amount,
        currency: gateway.currency().to_string(),
        receipt: new_receipt(),
    };
    let order = gateway.create_order(&request).await?;

    tracing::info!(user_id = %user.user_id, amount, receipt = %request.receipt, "payment order created");
    audit::record(
        &state.orm,
        user.user_id,
        "payment_order_create",
        "payments",
        json!({ "receipt": request.receipt, "amount": amount, "gateway_order": order.get("id") }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment order created",
        PaymentOrderResponse {
            order,
            key: gateway.key_id().to_string(),
        },
        None,
    ))
}
