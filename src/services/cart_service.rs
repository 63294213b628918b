use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{LockType, OnConflict},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::cart::{self, CartAction, CartLine, StockView},
    dto::cart::UpdateCartItemRequest,
    entity::{
        CartItems, Carts, Products,
        cart_items::{self, Column as CartItemCol},
        carts::{self, Column as CartCol},
        products::Column as ProdCol,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, Product},
    response::ApiResponse,
    routes::params::parse_id,
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("No cart exists".into()))?;

    let lines = load_lines(&state.orm, cart.id).await?;
    let view = cart_view(&state.orm, cart, lines).await?;
    Ok(ApiResponse::success("OK", view, None))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    let raw_id = payload
        .product_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Product ID is required".into()))?;
    let product_id = parse_id(raw_id, "product")?;

    let action: CartAction = payload
        .action
        .as_deref()
        .and_then(|action| action.parse().ok())
        .ok_or_else(|| AppError::BadRequest("Invalid action type".into()))?;
    let quantity = payload.quantity.unwrap_or(1);

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let cart = lock_or_create_cart(&txn, user.user_id).await?;
    let mut lines = load_lines(&txn, cart.id).await?;

    cart::apply_action(
        &mut lines,
        &StockView {
            product_id: product.id,
            sale_price: product.sale_price,
            stock: product.stock,
        },
        action,
        quantity,
    )?;

    let cart = save_lines(&txn, cart, &lines).await?;
    txn.commit().await?;

    tracing::debug!(user_id = %user.user_id, %product_id, ?action, quantity, "cart updated");
    audit::record(
        &state.orm,
        user.user_id,
        "cart_update",
        "carts",
        json!({ "product_id": product_id, "action": action, "quantity": quantity }),
    )
    .await;

    let view = cart_view(&state.orm, cart, lines).await?;
    Ok(ApiResponse::success("Cart updated", view, None))
}

/// Creates the caller's cart if needed and returns it locked `FOR UPDATE`
/// for the rest of `txn`.
async fn lock_or_create_cart(txn: &DatabaseTransaction, user_id: Uuid) -> AppResult<carts::Model> {
    Carts::insert(carts::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_amount: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(txn)
    .await?;

    lock_cart(txn, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart for {user_id} vanished after upsert")))
}

pub(crate) async fn lock_cart(
    txn: &DatabaseTransaction,
    user_id: Uuid,
) -> AppResult<Option<carts::Model>> {
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(txn)
        .await?)
}

pub(crate) async fn load_lines<C: ConnectionTrait>(conn: &C, cart_id: Uuid) -> AppResult<Vec<CartLine>> {
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::Position)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| CartLine {
            product_id: row.product_id,
            price: row.price,
            quantity: row.quantity,
        })
        .collect())
}

/// Rewrites the cart's lines and total in one go. Callers hold the cart lock.
pub(crate) async fn save_lines(
    txn: &DatabaseTransaction,
    cart: carts::Model,
    lines: &[CartLine],
) -> AppResult<carts::Model> {
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(txn)
        .await?;

    if !lines.is_empty() {
        let rows = lines.iter().enumerate().map(|(position, line)| cart_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            product_id: Set(line.product_id),
            price: Set(line.price),
            quantity: Set(line.quantity),
            position: Set(position as i32),
        });
        CartItems::insert_many(rows).exec_without_returning(txn).await?;
    }

    let mut active: carts::ActiveModel = cart.into();
    active.total_amount = Set(cart::total(lines)?);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

async fn cart_view<C: ConnectionTrait>(
    conn: &C,
    cart: carts::Model,
    lines: Vec<CartLine>,
) -> AppResult<Cart> {
    let ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
    let mut products: HashMap<Uuid, Product> = HashMap::new();
    if !ids.is_empty() {
        for model in Products::find().filter(ProdCol::Id.is_in(ids)).all(conn).await? {
            products.insert(model.id, Product::try_from(model)?);
        }
    }

    let items = lines
        .into_iter()
        .map(|line| CartItem {
            product: products.get(&line.product_id).cloned(),
            product_id: line.product_id,
            price: line.price,
            quantity: line.quantity,
        })
        .collect();

    Ok(Cart {
        id: cart.id,
        user_id: cart.user_id,
        items,
        total_amount: cart.total_amount,
        updated_at: cart.updated_at.with_timezone(&Utc),
    })
}
