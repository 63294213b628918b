use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    auth::{hash_password, verify_password},
    domain::{
        ValidationError,
        user::{ProfileDraft, Role, validate_email, validate_password, validate_profile},
    },
    dto::auth::{
        AccessTokenResponse, LoginRequest, LoginResponse, SignupRequest, UpdatePasswordRequest,
    },
    entity::{
        Users,
        users::{self, Column as UserCol},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    state::AppState,
};

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ValidationError::new(field, format!("{field} is required")))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".into())
}

/// Creates a regular account. The role is always `user`; admins are
/// promoted afterwards.
pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<ApiResponse<User>> {
    let name = required(payload.name, "name")?;
    let age = payload
        .age
        .ok_or_else(|| ValidationError::new("age", "age is required"))?;
    let email = normalize_email(&required(payload.email, "email")?);
    let address = required(payload.address, "address")?;
    let contact = required(payload.contact, "contact")?;
    let password = required(payload.password, "password")?;

    validate_profile(&ProfileDraft {
        name: &name,
        age,
        address: &address,
        contact: &contact,
    })?;
    validate_email(&email)?;
    validate_password(&password)?;

    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .is_some();
    if exists {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        age: Set(age),
        email: Set(email),
        address: Set(address.trim().to_string()),
        contact: Set(contact.trim().to_string()),
        password_hash: Set(hash_password(&password)?),
        role: Set(Role::User.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, "user signed up");
    audit::record(
        &state.orm,
        user.id,
        "user_signup",
        "users",
        json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created successfully",
        User::try_from(user)?,
        None,
    ))
}

/// Verifies credentials and returns the response body together with a
/// freshly issued refresh token for the cookie.
pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<(ApiResponse<LoginResponse>, String)> {
    let email = normalize_email(&required(payload.email, "email")?);
    let password = required(payload.password, "password")?;

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "login with wrong password");
        return Err(invalid_credentials());
    }

    let user = User::try_from(user)?;
    let access_token = state.jwt.issue_access(user.id, &user.email, user.role)?;
    let refresh_token = state.jwt.issue_refresh(user.id, &user.email, user.role)?;

    audit::record(
        &state.orm,
        user.id,
        "user_login",
        "users",
        json!({ "user_id": user.id }),
    )
    .await;

    Ok((
        ApiResponse::success("Login successful", LoginResponse { access_token, user }, None),
        refresh_token,
    ))
}

/// Issues a new access token from a refresh token. The role is re-read so a
/// promotion or demotion takes effect on the next refresh.
pub async fn refresh(
    state: &AppState,
    refresh_token: Option<&str>,
) -> AppResult<ApiResponse<AccessTokenResponse>> {
    let token = refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))?;
    let claims = state.jwt.verify_refresh(token)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

    let user = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let user = User::try_from(user)?;

    let access_token = state.jwt.issue_access(user.id, &user.email, user.role)?;
    Ok(ApiResponse::success(
        "Token refreshed",
        AccessTokenResponse { access_token },
        None,
    ))
}

pub async fn update_password(
    state: &AppState,
    user: &AuthUser,
    payload: UpdatePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let old_password = required(payload.old_password, "oldPassword")?;
    let new_password = required(payload.new_password, "newPassword")?;

    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if !verify_password(&old_password, &existing.password_hash)? {
        return Err(AppError::Unauthorized("Old password is incorrect".into()));
    }
    validate_password(&new_password)?;

    let mut active: users::ActiveModel = existing.into();
    active.password_hash = Set(hash_password(&new_password)?);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        user.user_id,
        "password_update",
        "users",
        json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password updated successfully",
        json!({}),
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_required_field_is_rejected() {
        let err = required(Some("   ".into()), "name").unwrap_err();
        assert_eq!(err.message, "name is required");
        assert_eq!(required(Some("Ann".into()), "name").unwrap(), "Ann");
    }

    #[test]
    fn emails_are_compared_case_insensitively() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }
}
