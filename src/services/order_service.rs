use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        ValidationError,
        cart::{CartError, CartLine},
        order::{self, OrderError, OrderStatus},
        require_text,
    },
    dto::orders::{OrderList, OrderWithItems, PlaceOrderRequest},
    entity::{
        OrderItems, Orders, Products,
        order_items::{self, Column as OrderItemCol},
        orders::{self, Column as OrderCol},
        products::Column as ProdCol,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::cart_service,
    state::AppState,
};

/// Turns the caller's cart into a pending order.
///
/// The cart row and every ordered product are locked for the whole
/// transaction; stock is deducted here and the cart is emptied (not deleted)
/// before commit. Any failure leaves cart, stock and orders untouched.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let shipping_address = payload.shipping_address.unwrap_or_default();
    require_text("shippingAddress", &shipping_address)?;
    let shipping_address = shipping_address.trim().to_string();

    let txn = state.orm.begin().await?;

    let cart = cart_service::lock_cart(&txn, user.user_id)
        .await?
        .ok_or(OrderError::NoCartExists)?;
    let lines = cart_service::load_lines(&txn, cart.id).await?;
    let snapshot = order::snapshot_cart(&lines)?;

    deduct_stock(&txn, &snapshot.items).await?;

    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total_amount: Set(snapshot.total_amount),
        shipping_address: Set(shipping_address),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(snapshot.items.len());
    for (position, line) in snapshot.items.iter().enumerate() {
        let item = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            price: Set(line.price),
            quantity: Set(line.quantity),
            position: Set(position as i32),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    cart_service::save_lines(&txn, cart, &[]).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %user.user_id, total = order.total_amount, "order placed");
    audit::record(
        &state.orm,
        user.user_id,
        "order_place",
        "orders",
        json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed successfully",
        OrderWithItems {
            order: Order::try_from(order)?,
            items,
        },
        None,
    ))
}

/// Locks each product in id order, checks it still covers the line and
/// decrements it.
async fn deduct_stock(txn: &DatabaseTransaction, lines: &[CartLine]) -> AppResult<()> {
    let mut ordered: Vec<&CartLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.product_id);

    for line in ordered {
        let product = Products::find_by_id(line.product_id)
            .lock(LockType::Update)
            .one(txn)
            .await?
            .ok_or_else(|| ValidationError::new("productId", "A product is no longer available"))?;

        if product.stock < line.quantity {
            return Err(CartError::InsufficientStock {
                available: product.stock.max(0),
            }
            .into());
        }

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(line.product_id))
            .exec(txn)
            .await?;
    }
    Ok(())
}

async fn restore_stock(txn: &DatabaseTransaction, lines: &[CartLine]) -> AppResult<()> {
    let mut ordered: Vec<&CartLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.product_id);

    for line in ordered {
        // Deleted products are skipped; update_many simply matches no row.
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(line.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(line.product_id))
            .exec(txn)
            .await?;
    }
    Ok(())
}

/// Keeps stock in step with an order crossing the `cancelled` boundary.
/// Entering it gives the quantities back, leaving it takes them again and
/// fails with `InsufficientStock` when a product no longer covers its line.
/// Any other transition leaves stock alone.
pub(crate) async fn sync_stock(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    from: OrderStatus,
    to: OrderStatus,
) -> AppResult<()> {
    let entering = from != OrderStatus::Cancelled && to == OrderStatus::Cancelled;
    let leaving = from == OrderStatus::Cancelled && to != OrderStatus::Cancelled;
    if !entering && !leaving {
        return Ok(());
    }

    let lines: Vec<CartLine> = load_items(txn, order_id)
        .await?
        .into_iter()
        .map(|item| CartLine {
            product_id: item.product_id,
            price: item.price,
            quantity: item.quantity,
        })
        .collect();

    if entering {
        restore_stock(txn, &lines).await
    } else {
        deduct_stock(txn, &lines).await
    }
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt);
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
        "OK",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = visible_order(&state.orm, user, id, false).await?;
    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: Order::try_from(order)?,
            items,
        },
        None,
    ))
}

pub async fn cancel_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let order = visible_order(&txn, user, id, true).await?;
    let status: OrderStatus = order.status.parse()?;
    order::ensure_cancellable(status)?;

    sync_stock(&txn, order.id, status, OrderStatus::Cancelled).await?;

    let mut active: orders::ActiveModel = order.into();
    active.status = Set(OrderStatus::Cancelled.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, cancelled_by = %user.user_id, "order cancelled");
    audit::record(
        &state.orm,
        user.user_id,
        "order_cancel",
        "orders",
        json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success("Order cancelled", Order::try_from(order)?, None))
}

/// Loads an order the caller may see. Orders owned by someone else look
/// exactly like missing ones to non-admins.
pub(crate) async fn visible_order<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    id: Uuid,
    for_update: bool,
) -> AppResult<orders::Model> {
    let mut finder = Orders::find_by_id(id);
    if !user.is_admin() {
        finder = finder.filter(OrderCol::UserId.eq(user.user_id));
    }
    if for_update {
        finder = finder.lock(LockType::Update);
    }

    finder
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))
}

pub(crate) async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect())
}
