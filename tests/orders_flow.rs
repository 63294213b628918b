//! Cart and order flows against a real Postgres. Skipped unless
//! `TEST_DATABASE_URL` or `DATABASE_URL` is set. Every test creates its own
//! users and products, so tests can share one database and run in parallel.

use axum_shop_api::{
    auth::JwtKeys,
    db::{create_orm_conn, run_migrations},
    domain::{order::OrderStatus, product::Category, user::Role},
    dto::{
        cart::UpdateCartItemRequest,
        orders::{PlaceOrderRequest, UpdateOrderStatusRequest},
    },
    entity::{Products, products, users},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{OrderListQuery, ProductSearchQuery},
    services::{admin_service, cart_service, order_service, product_service},
    state::AppState,
};
use chrono::Duration;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};
use serde_json::json;
use uuid::Uuid;

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database flow tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let keys = JwtKeys::new("flow-access", "flow-refresh", Duration::minutes(15), Duration::days(7));
    Ok(Some(AppState::new(orm, keys, None)))
}

async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let email = format!("{}-{}@example.com", role, Uuid::new_v4().simple());
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Flow Tester".into()),
        age: Set(30),
        email: Set(email.clone()),
        address: Set("1 Test Lane".into()),
        contact: Set("5550100".into()),
        password_hash: Set("not-a-real-hash".into()),
        role: Set(role.as_str().into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        email,
        role,
    })
}

async fn create_product(
    state: &AppState,
    seller: &AuthUser,
    name: &str,
    sale_price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller.user_id),
        name: Set(name.to_string()),
        description: Set("flow test product".into()),
        cost_price: Set(sale_price + 5),
        sale_price: Set(sale_price),
        category: Set(Category::Electronics.as_str().into()),
        stock: Set(stock),
        images: Set(json!([])),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {id} missing"))?;
    Ok(product.stock)
}

async fn cart_action(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    action: &str,
    quantity: Option<i32>,
) -> Result<i64, AppError> {
    let resp = cart_service::update_cart_item(
        state,
        user,
        UpdateCartItemRequest {
            product_id: Some(product_id.to_string()),
            action: Some(action.to_string()),
            quantity,
        },
    )
    .await?;
    Ok(resp.data.map(|cart| cart.total_amount).unwrap_or_default())
}

async fn place(state: &AppState, user: &AuthUser) -> Result<Uuid, AppError> {
    let resp = order_service::place_order(
        state,
        user,
        PlaceOrderRequest {
            shipping_address: Some("42 Order Road".into()),
        },
    )
    .await?;
    Ok(resp.data.map(|placed| placed.order.id).unwrap_or_default())
}

async fn set_status(
    state: &AppState,
    admin: &AuthUser,
    order_id: Uuid,
    status: &str,
) -> Result<OrderStatus, AppError> {
    let resp = admin_service::update_order_status(
        state,
        admin,
        order_id,
        UpdateOrderStatusRequest {
            status: Some(status.into()),
        },
    )
    .await?;
    Ok(resp.data.map(|order| order.status).unwrap_or(OrderStatus::Pending))
}

#[tokio::test]
async fn cart_total_snapshot_and_reset_on_placement() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let user = create_user(&state, Role::User).await?;
    let a = create_product(&state, &admin, "Flow A", 10, 10).await?;
    let b = create_product(&state, &admin, "Flow B", 5, 10).await?;

    assert_eq!(cart_action(&state, &user, a, "add", Some(2)).await?, 20);
    assert_eq!(cart_action(&state, &user, b, "add", None).await?, 25);

    let resp = order_service::place_order(
        &state,
        &user,
        PlaceOrderRequest {
            shipping_address: Some("  42 Order Road ".into()),
        },
    )
    .await?;
    let placed = resp.data.expect("placed order");
    assert_eq!(placed.order.total_amount, 25);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.shipping_address, "42 Order Road");
    let lines: Vec<(Uuid, i64, i32)> = placed
        .items
        .iter()
        .map(|item| (item.product_id, item.price, item.quantity))
        .collect();
    assert_eq!(lines, vec![(a, 10, 2), (b, 5, 1)]);

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_amount, 0);

    assert_eq!(stock_of(&state, a).await?, 8);
    assert_eq!(stock_of(&state, b).await?, 9);
    Ok(())
}

#[tokio::test]
async fn price_snapshot_survives_catalog_changes() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let user = create_user(&state, Role::User).await?;
    let id = create_product(&state, &admin, "Flow Snapshot", 10, 10).await?;

    cart_action(&state, &user, id, "add", Some(1)).await?;

    let product = Products::find_by_id(id).one(&state.orm).await?.expect("product");
    let mut active: products::ActiveModel = product.into();
    active.sale_price = Set(7);
    active.update(&state.orm).await?;

    assert_eq!(cart_action(&state, &user, id, "increase", None).await?, 20);
    Ok(())
}

#[tokio::test]
async fn stock_ceiling_and_missing_items_are_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let user = create_user(&state, Role::User).await?;
    let id = create_product(&state, &admin, "Flow Scarce", 4, 3).await?;

    match cart_action(&state, &user, id, "add", Some(4)).await {
        Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Only 3 units available"),
        other => panic!("unexpected {other:?}"),
    }

    assert!(matches!(
        cart_action(&state, &user, id, "remove", None).await,
        Err(AppError::NotFound(_))
    ));

    assert_eq!(cart_action(&state, &user, id, "add", Some(3)).await?, 12);
    assert!(matches!(
        cart_action(&state, &user, id, "increase", None).await,
        Err(AppError::BadRequest(_))
    ));
    assert_eq!(cart_action(&state, &user, id, "decrease", None).await?, 8);
    assert_eq!(cart_action(&state, &user, id, "remove", None).await?, 0);
    assert!(matches!(
        cart_action(&state, &user, id, "remove", None).await,
        Err(AppError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn placing_without_cart_or_items_creates_nothing() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let user = create_user(&state, Role::User).await?;
    let id = create_product(&state, &admin, "Flow Empty", 3, 5).await?;

    match place(&state, &user).await {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "No cart exists"),
        other => panic!("unexpected {other:?}"),
    }

    cart_action(&state, &user, id, "add", Some(1)).await?;
    cart_action(&state, &user, id, "remove", None).await?;
    assert!(matches!(place(&state, &user).await, Err(AppError::BadRequest(_))));

    let listed = order_service::list_orders(&state, &user, OrderListQuery::default()).await?;
    assert_eq!(listed.meta.and_then(|m| m.total), Some(0));
    assert_eq!(stock_of(&state, id).await?, 5);
    Ok(())
}

#[tokio::test]
async fn placement_checks_stock_at_order_time() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let first = create_user(&state, Role::User).await?;
    let second = create_user(&state, Role::User).await?;
    let id = create_product(&state, &admin, "Flow Race", 2, 3).await?;

    cart_action(&state, &first, id, "add", Some(2)).await?;
    cart_action(&state, &second, id, "add", Some(2)).await?;

    place(&state, &first).await?;
    assert!(matches!(place(&state, &second).await, Err(AppError::BadRequest(_))));

    assert_eq!(stock_of(&state, id).await?, 1);
    let cart = cart_service::get_cart(&state, &second).await?.data.expect("cart");
    assert_eq!(cart.total_amount, 4);
    Ok(())
}

#[tokio::test]
async fn cancellation_rules_and_stock_restore() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let user = create_user(&state, Role::User).await?;
    let id = create_product(&state, &admin, "Flow Cancel", 6, 10).await?;

    cart_action(&state, &user, id, "add", Some(3)).await?;
    let order_id = place(&state, &user).await?;
    assert_eq!(stock_of(&state, id).await?, 7);

    let cancelled = order_service::cancel_order(&state, &user, order_id).await?;
    assert_eq!(cancelled.data.map(|o| o.status), Some(OrderStatus::Cancelled));
    assert_eq!(stock_of(&state, id).await?, 10);

    match order_service::cancel_order(&state, &user, order_id).await {
        Err(AppError::Conflict(msg)) => assert_eq!(msg, "Order already cancelled"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(stock_of(&state, id).await?, 10);

    cart_action(&state, &user, id, "add", Some(1)).await?;
    let shipped = place(&state, &user).await?;
    assert_eq!(set_status(&state, &admin, shipped, "shipped").await?, OrderStatus::Shipped);
    assert!(matches!(
        order_service::cancel_order(&state, &user, shipped).await,
        Err(AppError::Conflict(_))
    ));

    cart_action(&state, &user, id, "add", Some(1)).await?;
    let processing = place(&state, &user).await?;
    set_status(&state, &admin, processing, "processing").await?;
    let by_admin = order_service::cancel_order(&state, &admin, processing).await?;
    assert_eq!(by_admin.data.map(|o| o.status), Some(OrderStatus::Cancelled));
    Ok(())
}

#[tokio::test]
async fn admin_status_update_is_a_permissive_overwrite() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let user = create_user(&state, Role::User).await?;
    let id = create_product(&state, &admin, "Flow Override", 9, 5).await?;

    cart_action(&state, &user, id, "add", Some(2)).await?;
    let order_id = place(&state, &user).await?;

    assert_eq!(set_status(&state, &admin, order_id, "delivered").await?, OrderStatus::Delivered);
    assert_eq!(set_status(&state, &admin, order_id, "pending").await?, OrderStatus::Pending);
    assert_eq!(stock_of(&state, id).await?, 3);
    assert_eq!(set_status(&state, &admin, order_id, "cancelled").await?, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, id).await?, 5);

    assert!(matches!(
        set_status(&state, &admin, order_id, "paid").await,
        Err(AppError::BadRequest(_))
    ));
    Ok(())
}

#[tokio::test]
async fn reopening_a_cancelled_order_takes_stock_again() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let user = create_user(&state, Role::User).await?;
    let other = create_user(&state, Role::User).await?;
    let id = create_product(&state, &admin, "Flow Reopen", 8, 5).await?;

    cart_action(&state, &user, id, "add", Some(2)).await?;
    let order_id = place(&state, &user).await?;
    assert_eq!(stock_of(&state, id).await?, 3);

    order_service::cancel_order(&state, &user, order_id).await?;
    assert_eq!(stock_of(&state, id).await?, 5);

    assert_eq!(set_status(&state, &admin, order_id, "pending").await?, OrderStatus::Pending);
    assert_eq!(stock_of(&state, id).await?, 3);

    order_service::cancel_order(&state, &user, order_id).await?;
    assert_eq!(stock_of(&state, id).await?, 5);

    // Same-side overwrites leave stock alone.
    assert_eq!(set_status(&state, &admin, order_id, "cancelled").await?, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, id).await?, 5);

    // Reopening needs the stock to still be there.
    cart_action(&state, &other, id, "add", Some(4)).await?;
    place(&state, &other).await?;
    assert_eq!(stock_of(&state, id).await?, 1);
    match set_status(&state, &admin, order_id, "processing").await {
        Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Only 1 units available"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(stock_of(&state, id).await?, 1);
    let still = order_service::get_order(&state, &admin, order_id).await?;
    assert_eq!(still.data.map(|o| o.order.status), Some(OrderStatus::Cancelled));
    Ok(())
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let owner = create_user(&state, Role::User).await?;
    let stranger = create_user(&state, Role::User).await?;
    let id = create_product(&state, &admin, "Flow Private", 4, 5).await?;

    cart_action(&state, &owner, id, "add", Some(1)).await?;
    let order_id = place(&state, &owner).await?;

    assert!(matches!(
        order_service::get_order(&state, &stranger, order_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        order_service::cancel_order(&state, &stranger, order_id).await,
        Err(AppError::NotFound(_))
    ));

    let seen_by_owner = order_service::get_order(&state, &owner, order_id).await?;
    assert_eq!(seen_by_owner.data.map(|o| o.items.len()), Some(1));
    let seen_by_admin = order_service::get_order(&state, &admin, order_id).await?;
    assert_eq!(seen_by_admin.data.map(|o| o.order.user_id), Some(owner.user_id));

    let stranger_orders = order_service::list_orders(&state, &stranger, OrderListQuery::default()).await?;
    assert!(stranger_orders.data.expect("list").items.is_empty());
    Ok(())
}

#[tokio::test]
async fn search_price_range_is_inclusive() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let tag = Uuid::new_v4().simple().to_string();
    for price in [9, 10, 15, 20, 21] {
        create_product(&state, &admin, &format!("Range {tag} {price}"), price, 1).await?;
    }

    let resp = product_service::search_products(
        &state,
        ProductSearchQuery {
            name: Some(tag.to_uppercase()),
            min_price: Some(10),
            max_price: Some(20),
            sort_by: Some("salePrice".into()),
            order: Some("asc".into()),
            ..Default::default()
        },
    )
    .await?;

    let prices: Vec<i64> = resp
        .data
        .expect("products")
        .items
        .iter()
        .map(|p| p.sale_price)
        .collect();
    assert_eq!(prices, vec![10, 15, 20]);
    Ok(())
}
