use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use crate::{
    auth::REFRESH_COOKIE,
    dto::auth::{
        AccessTokenResponse, LoginRequest, LoginResponse, SignupRequest, UpdatePasswordRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/update-password", put(update_password))
}

#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<User>),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    security(()),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = auth_service::signup(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token in the body, refresh token in the `refreshToken` cookie", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid email or password")
    ),
    security(()),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let (resp, refresh_token) = auth_service::login(&state, payload).await?;

    let max_age = time::Duration::seconds(state.jwt.refresh_ttl().num_seconds());
    let cookie = Cookie::build((REFRESH_COOKIE, refresh_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(max_age)
        .build();

    Ok((jar.add(cookie), Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 200, description = "New access token", body = ApiResponse<AccessTokenResponse>),
        (status = 401, description = "Missing, invalid or expired refresh token")
    ),
    security(()),
    tag = "Auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<ApiResponse<AccessTokenResponse>>> {
    let token = jar.get(REFRESH_COOKIE).map(|cookie| cookie.value());
    let resp = auth_service::refresh(&state, token).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Refresh cookie cleared")
    ),
    security(()),
    tag = "Auth"
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<serde_json::Value>>) {
    let jar = jar.remove(Cookie::build(REFRESH_COOKIE).path("/"));
    (
        jar,
        Json(ApiResponse::success("Logged out successfully", json!({}), None)),
    )
}

#[utoipa::path(
    put,
    path = "/api/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password too weak"),
        (status = 401, description = "Old password is incorrect")
    ),
    tag = "Auth"
)]
pub async fn update_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::update_password(&state, &user, payload).await?;
    Ok(Json(resp))
}
