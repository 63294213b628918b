use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::user::{ProfileDraft, Role, validate_profile},
    dto::users::{UpdateProfileRequest, UpdateRoleRequest, UserList},
    entity::{
        Users,
        users::{self, Column as UserCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

async fn find_user(state: &AppState, id: Uuid) -> AppResult<users::Model> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = find_user(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", User::try_from(model)?, None))
}

/// Self-service profile edit. Only name, age, address and contact can
/// change here; email, password and role have their own paths.
pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    if payload.is_empty() {
        return Err(AppError::BadRequest("No valid fields to update".into()));
    }

    let existing = find_user(state, user.user_id).await?;
    let name = payload.name.unwrap_or_else(|| existing.name.clone());
    let age = payload.age.unwrap_or(existing.age);
    let address = payload.address.unwrap_or_else(|| existing.address.clone());
    let contact = payload.contact.unwrap_or_else(|| existing.contact.clone());

    validate_profile(&ProfileDraft {
        name: &name,
        age,
        address: &address,
        contact: &contact,
    })?;

    let mut active: users::ActiveModel = existing.into();
    active.name = Set(name.trim().to_string());
    active.age = Set(age);
    active.address = Set(address.trim().to_string());
    active.contact = Set(contact.trim().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "profile_update",
        "users",
        json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated successfully",
        User::try_from(updated)?,
        None,
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let role: Role = payload.role.as_deref().unwrap_or_default().trim().parse()?;

    let existing = find_user(state, id).await?;
    let mut active: users::ActiveModel = existing.into();
    active.role = Set(role.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    tracing::info!(target_user = %id, %role, changed_by = %user.user_id, "user role updated");
    audit::record(
        &state.orm,
        user.user_id,
        "role_update",
        "users",
        json!({ "user_id": id, "role": role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User role updated",
        User::try_from(updated)?,
        None,
    ))
}
