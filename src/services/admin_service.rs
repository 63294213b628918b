use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::order::{OrderError, OrderStatus},
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    entity::{
        Orders,
        orders::{self, Column as OrderCol},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Orders::find();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse()?;
        finder = finder.filter(OrderCol::Status.eq(status.as_str()));
    }
    let finder = finder.order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Overwrites an order's status with any known value. There is no
/// transition check; stock only moves when the order enters or leaves
/// `cancelled`.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let status: OrderStatus = payload
        .status
        .as_deref()
        .ok_or(OrderError::InvalidStatus)?
        .trim()
        .parse()?;

    let txn = state.orm.begin().await?;

    let existing = order_service::visible_order(&txn, user, id, true).await?;
    let previous: OrderStatus = existing.status.parse()?;
    order_service::sync_stock(&txn, existing.id, previous, status).await?;

    let mut active: orders::ActiveModel = existing.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, from = %previous, to = %status, "order status overwritten");
    audit::record(
        &state.orm,
        user.user_id,
        "order_status_update",
        "orders",
        json!({ "order_id": order.id, "from": previous, "to": status }),
    )
    .await;

    Ok(ApiResponse::success("Order status updated", Order::try_from(order)?, None))
}
