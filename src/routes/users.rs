use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, put},
};

use crate::{
    domain::user::Role,
    dto::users::{UpdateProfileRequest, UpdateRoleRequest, UserList},
    error::AppResult,
    middleware::auth::{AuthUser, require_role},
    models::User,
    response::ApiResponse,
    routes::params::{Pagination, parse_id},
    services::user_service,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/all", get(list_users))
        .route("/updateRole/{id}", put(update_role))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_role(Role::Admin),
        ));

    Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .merge(admin)
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Caller's profile", body = ApiResponse<User>),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 400, description = "No valid fields to update")
    ),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/all",
    params(Pagination),
    responses(
        (status = 200, description = "All users, newest first", body = ApiResponse<UserList>),
        (status = 403, description = "Admin only")
    ),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/updateRole/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<User>),
        (status = 400, description = "Invalid role"),
        (status = 404, description = "User not found")
    ),
    tag = "Users"
)]
pub async fn update_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let id = parse_id(&id, "user")?;
    let resp = user_service::update_role(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
