use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, patch},
};

use crate::{
    domain::user::Role,
    dto::cart::UpdateCartItemRequest,
    error::AppResult,
    middleware::auth::{AuthUser, require_role},
    models::Cart,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/item", patch(update_cart_item))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_role(Role::User),
        ))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Caller's cart with current product details", body = ApiResponse<Cart>),
        (status = 404, description = "No cart exists")
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/item",
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Cart updated", body = ApiResponse<Cart>),
        (status = 400, description = "Invalid product ID, action or quantity, or not enough stock"),
        (status = 404, description = "Product not found or not in cart")
    ),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::update_cart_item(&state, &user, payload).await?;
    Ok(Json(resp))
}
