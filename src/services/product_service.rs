use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        ValidationError,
        product::{Category, ProductDraft, validate_product, validate_stock},
    },
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        Products,
        products::{ActiveModel, Column},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductSearchQuery, ProductSortBy, SortOrder},
    state::AppState,
};

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, format!("{field} is required")))
}

fn parse_category(raw: &str) -> Result<Category, ValidationError> {
    raw.trim().parse()
}

pub async fn list_products(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Products::find().order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn search_products(
    state: &AppState,
    query: ProductSearchQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (sort_by, order) = query.sorting()?;
    let mut condition = Condition::all();

    if let Some(name) = query.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Name).ilike(format!("%{}%", escape_like(name))));
    }
    if let Some(category) = query.category.as_deref().filter(|s| !s.is_empty()) {
        let category = parse_category(category)?;
        condition = condition.add(Column::Category.eq(category.as_str()));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::SalePrice.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::SalePrice.lte(max_price));
    }

    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::SalePrice => Column::SalePrice,
        ProductSortBy::CostPrice => Column::CostPrice,
        ProductSortBy::Stock => Column::Stock,
    };

    let finder = Products::find().filter(condition);
    let finder = match order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let items = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success("Products", ProductList { items }, None))
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    Ok(ApiResponse::success("Product", Product::try_from(product)?, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let name = required(payload.name, "name")?;
    let description = required(payload.description, "description")?;
    let cost_price = required(payload.cost_price, "costPrice")?;
    let sale_price = required(payload.sale_price, "salePrice")?;
    let category = parse_category(&required(payload.category, "category")?)?;
    let stock = payload.stock.unwrap_or(0);

    validate_product(&ProductDraft {
        name: &name,
        description: &description,
        cost_price,
        sale_price,
        stock,
    })?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        seller_id: Set(user.user_id),
        name: Set(name.trim().to_string()),
        description: Set(description.trim().to_string()),
        cost_price: Set(cost_price),
        sale_price: Set(sale_price),
        category: Set(category.as_str().to_string()),
        stock: Set(stock),
        images: Set(json!(payload.images)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, seller_id = %user.user_id, "product created");
    audit::record(
        &state.orm,
        user.user_id,
        "product_create",
        "products",
        json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created successfully",
        Product::try_from(product)?,
        None,
    ))
}

/// Partial update. The merged record is validated as a whole, so a new
/// sale price is checked against the stored cost price and vice versa.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if let Some(stock) = payload.stock {
        validate_stock(stock)?;
    }
    let category = payload.category.as_deref().map(parse_category).transpose()?;

    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let name = payload.name.unwrap_or_else(|| existing.name.clone());
    let description = payload
        .description
        .unwrap_or_else(|| existing.description.clone());
    let cost_price = payload.cost_price.unwrap_or(existing.cost_price);
    let sale_price = payload.sale_price.unwrap_or(existing.sale_price);
    let stock = payload.stock.unwrap_or(existing.stock);

    validate_product(&ProductDraft {
        name: &name,
        description: &description,
        cost_price,
        sale_price,
        stock,
    })?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(name.trim().to_string());
    active.description = Set(description.trim().to_string());
    active.cost_price = Set(cost_price);
    active.sale_price = Set(sale_price);
    active.stock = Set(stock);
    if let Some(category) = category {
        active.category = Set(category.as_str().to_string());
    }
    if let Some(images) = payload.images {
        active.images = Set(json!(images));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "product_update",
        "products",
        json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated successfully",
        Product::try_from(product)?,
        None,
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Product"));
    }

    tracing::info!(product_id = %id, "product deleted");
    audit::record(
        &state.orm,
        user.user_id,
        "product_delete",
        "products",
        json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deleted successfully",
        json!({ "id": id }),
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_in_names_are_literal() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }

    #[test]
    fn missing_required_field_is_named() {
        let err = required::<i64>(None, "costPrice").unwrap_err();
        assert_eq!(err.message, "costPrice is required");
    }
}
